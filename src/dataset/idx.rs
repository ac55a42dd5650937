//! IDX binary files as used by MNIST and its derivatives (Fashion-MNIST,
//! EMNIST, ...).
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index in [0, n_classes)
//! ```

use std::path::Path;

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Images and labels decoded from an IDX pair.
///
/// Pixels stay as bytes; [`Dataset::get_input`] scales them to `[0, 1]` on
/// demand.
#[derive(Debug, Clone)]
pub struct IdxDataset {
    pixels: Vec<u8>,
    labels: Vec<u8>,
    rows: usize,
    cols: usize,
    n_classes: usize,
}

impl IdxDataset {
    /// Reads and decodes an image file and its label file.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(images: P, labels: Q, n_classes: usize) -> Result<IdxDataset> {
        let image_bytes = std::fs::read(images.as_ref())?;
        let label_bytes = std::fs::read(labels.as_ref())?;
        let ds = IdxDataset::parse(&image_bytes, &label_bytes, n_classes)?;
        debug!(
            images = %images.as_ref().display(),
            count = ds.count(),
            rows = ds.rows,
            cols = ds.cols,
            "idx dataset loaded"
        );
        Ok(ds)
    }

    /// Decodes an IDX3 image buffer and an IDX1 label buffer.
    pub fn parse(image_bytes: &[u8], label_bytes: &[u8], n_classes: usize) -> Result<IdxDataset> {
        if n_classes < 2 {
            return Err(dataset_err(format!("n_classes must be at least 2, got {}", n_classes)));
        }

        // ── Image file ──────────────────────────────────────────────────────

        check_header(image_bytes, 16, 3, "image")?;
        let n_items = be_u32(image_bytes, 4);
        let rows = be_u32(image_bytes, 8);
        let cols = be_u32(image_bytes, 12);

        let n_pixels = rows
            .checked_mul(cols)
            .ok_or_else(|| dataset_err(format!("image size {}x{} overflows", rows, cols)))?;
        let image_len = n_items
            .checked_mul(n_pixels)
            .ok_or_else(|| dataset_err(format!("{} images of {} pixels overflow", n_items, n_pixels)))?;
        let image_end = image_len
            .checked_add(16)
            .ok_or_else(|| dataset_err(format!("image file of {} pixel bytes overflows", image_len)))?;
        if image_bytes.len() < image_end {
            return Err(dataset_err(format!(
                "image file too short: header declares {} items of {}x{} pixels, file is {} bytes",
                n_items,
                rows,
                cols,
                image_bytes.len()
            )));
        }

        // ── Label file ──────────────────────────────────────────────────────

        check_header(label_bytes, 8, 1, "label")?;
        let label_count = be_u32(label_bytes, 4);
        if label_count != n_items {
            return Err(dataset_err(format!(
                "image file declares {} items but label file declares {}",
                n_items, label_count
            )));
        }
        let label_end = n_items
            .checked_add(8)
            .ok_or_else(|| dataset_err(format!("label file of {} labels overflows", n_items)))?;
        if label_bytes.len() < label_end {
            return Err(dataset_err(format!(
                "label file too short: header declares {} labels, file is {} bytes",
                n_items,
                label_bytes.len()
            )));
        }

        let labels = label_bytes[8..label_end].to_vec();
        if let Some((i, &class)) = labels.iter().enumerate().find(|(_, &c)| c as usize >= n_classes) {
            return Err(dataset_err(format!(
                "label {} has class {}, out of range for {} classes",
                i, class, n_classes
            )));
        }

        Ok(IdxDataset {
            pixels: image_bytes[16..image_end].to_vec(),
            labels,
            rows,
            cols,
            n_classes,
        })
    }

    /// `(rows, cols)` of each image.
    pub fn image_size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Class index of sample `index`.
    pub fn label(&self, index: usize) -> Result<usize> {
        self.labels
            .get(index)
            .map(|&c| c as usize)
            .ok_or_else(|| self.out_of_range(index))
    }

    /// Raw pixel bytes of sample `index`, row-major.
    pub fn image(&self, index: usize) -> Result<&[u8]> {
        if index >= self.labels.len() {
            return Err(self.out_of_range(index));
        }
        let n = self.rows * self.cols;
        Ok(&self.pixels[index * n..(index + 1) * n])
    }

    fn out_of_range(&self, index: usize) -> NnError {
        NnError::IndexOutOfRange { row: index, col: 0, rows: self.labels.len(), cols: 1 }
    }
}

impl Dataset for IdxDataset {
    fn count(&self) -> usize {
        self.labels.len()
    }

    fn get_input(&self, index: usize) -> Result<Matrix> {
        let image = self.image(index)?;
        Ok(Matrix::row_vector(image.iter().map(|&px| px as f32 / 255.0).collect()))
    }

    fn get_output(&self, index: usize) -> Result<Matrix> {
        let class = self.label(index)?;
        let mut one_hot = Matrix::zeros(1, self.n_classes);
        one_hot.set(0, class, 1.0)?;
        Ok(one_hot)
    }
}

fn dataset_err(msg: String) -> NnError {
    NnError::Dataset(msg)
}

fn be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

/// Checks the reserved bytes, the uint8 dtype and the dimension count.
fn check_header(bytes: &[u8], header_len: usize, dims: u8, what: &str) -> Result<()> {
    if bytes.len() < header_len {
        return Err(dataset_err(format!(
            "{} file too short: expected at least {} header bytes, got {}",
            what,
            header_len,
            bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(dataset_err(format!(
            "{} file: bytes 0-1 must be 0x00 0x00, got 0x{:02X} 0x{:02X}",
            what, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(dataset_err(format!(
            "{} file: dtype byte must be 0x08 (uint8), got 0x{:02X}",
            what, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(dataset_err(format!(
            "{} file: expected {} dimensions, got {}",
            what, dims, bytes[3]
        )));
    }
    Ok(())
}
