use std::io::Read;

use serde_json::json;
use tiny_http::Request;

use sigmoid_net::Matrix;

use crate::routes::{error_message, error_response, ok, HttpResponse};
use crate::state::{lock, Mode, SharedState};
use crate::util::image::{grayscale_input, looks_like_image, square_side};

const MAX_BODY: u64 = 8 * 1024 * 1024;

/// POST /predict
///
/// The body is either an image (PNG, JPEG, BMP, GIF), scaled to the
/// square input layer as grayscale, or comma-separated input values.
pub fn handle(request: &mut Request, state: &SharedState) -> HttpResponse {
    let mut body = Vec::new();
    if let Err(e) = request.as_reader().take(MAX_BODY).read_to_end(&mut body) {
        return error_message(400, &format!("failed to read body: {}", e));
    }

    let mut st = lock(state);
    if st.is_training() {
        return error_message(409, "background training is running");
    }

    let input_size = st.network.input_size();
    let values = if looks_like_image(&body) {
        let Some(side) = square_side(input_size) else {
            return error_message(400, &format!("input layer of {} is not square; send values instead", input_size));
        };
        match grayscale_input(&body, side) {
            Ok(values) => values,
            Err(e) => return error_message(400, &format!("cannot decode image: {}", e)),
        }
    } else {
        match parse_values(&body) {
            Ok(values) => values,
            Err(msg) => return error_message(400, &msg),
        }
    };

    match st.network.predict(&Matrix::row_vector(values)) {
        Ok(prediction) => {
            st.mode = Mode::Testing;
            ok(&json!({
                "prediction": prediction,
                "outputs": st.network.outputs().data(),
            }))
        }
        Err(e) => error_response(&e),
    }
}

fn parse_values(body: &[u8]) -> Result<Vec<f32>, String> {
    let text = std::str::from_utf8(body).map_err(|_| "body is neither an image nor UTF-8 text".to_owned())?;
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().map_err(|_| format!("bad input value {:?}", s)))
        .collect()
}
