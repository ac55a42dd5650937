//! Turns an uploaded drawing into a network input.

use image::imageops::FilterType;

/// True when `bytes` start with the signature of a format `image` can decode.
pub fn looks_like_image(bytes: &[u8]) -> bool {
    image::guess_format(bytes).is_ok()
}

/// Side length of a square input layer, if `input_size` is a perfect square.
pub fn square_side(input_size: usize) -> Option<u32> {
    let side = (input_size as f64).sqrt().round() as usize;
    if side > 0 && side * side == input_size {
        u32::try_from(side).ok()
    } else {
        None
    }
}

/// Decodes image bytes, resizes to `side × side`, converts to grayscale,
/// and normalizes pixels to [0, 1].
///
/// Returns a flat row-major `Vec<f32>` of length `side * side`.
pub fn grayscale_input(bytes: &[u8], side: u32) -> Result<Vec<f32>, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let resized = img.resize_exact(side, side, FilterType::Triangle);
    Ok(resized.to_luma8().pixels().map(|p| p.0[0] as f32 / 255.0).collect())
}
