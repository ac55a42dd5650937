use std::io::Cursor;

use serde::Serialize;
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use sigmoid_net::NnError;

use crate::handlers;
use crate::state::SharedState;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn header(name: &str, value: &str) -> Header {
    // Only ever called with ASCII names and values.
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("ascii header")
}

fn bytes_response(status: u16, content_type: &str, body: Vec<u8>) -> HttpResponse {
    let len = body.len();
    Response::new(
        StatusCode(status),
        vec![header("Content-Type", content_type)],
        Cursor::new(body),
        Some(len),
        None,
    )
}

pub fn json_response<T: Serialize>(status: u16, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => bytes_response(status, "application/json", body),
        Err(e) => bytes_response(500, "text/plain", format!("serialization failed: {}", e).into_bytes()),
    }
}

pub fn ok<T: Serialize>(value: &T) -> HttpResponse {
    json_response(200, value)
}

/// `{"error": "..."}` with the given status.
pub fn error_message(status: u16, message: &str) -> HttpResponse {
    json_response(status, &json!({ "error": message }))
}

/// Maps a library error to a JSON error response. Server-side failures
/// are also logged.
pub fn error_response(err: &NnError) -> HttpResponse {
    let status = match err {
        NnError::ShapeMismatch { .. }
        | NnError::InvalidDimension(_)
        | NnError::IndexOutOfRange { .. }
        | NnError::LabelCountMismatch { .. }
        | NnError::Dataset(_) => 400,
        NnError::CorruptModel(_) => 422,
        NnError::Io(_) | NnError::Json(_) => 500,
    };
    if status >= 500 {
        warn!(error = %err, "request failed");
    }
    error_message(status, &err.to_string())
}

pub fn download_response(body: Vec<u8>, filename: &str) -> HttpResponse {
    let len = body.len();
    let disposition = format!("attachment; filename=\"{}\"", filename);
    Response::new(
        StatusCode(200),
        vec![
            header("Content-Type", "application/octet-stream"),
            header("Content-Disposition", &disposition),
        ],
        Cursor::new(body),
        Some(len),
        None,
    )
}

pub fn not_found() -> HttpResponse {
    error_message(404, "not found")
}

/// Value of `key` in a `a=1&b=2` query string.
pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let (path, query) = match url.split_once('?') {
        Some((p, q)) => (p.to_owned(), q.to_owned()),
        None => (url.clone(), String::new()),
    };
    debug!(method = %method, path = %path, "request");

    let response = match (method, path.as_str()) {
        (Method::Get, "/") => ok(&json!({
            "endpoints": [
                "GET /network", "GET /progress",
                "POST /train/start", "POST /train/stop", "POST /train/step?count=N",
                "POST /test?index=I", "POST /test/evaluate", "POST /predict",
                "POST /model/save", "POST /model/load", "GET /model/download"
            ]
        })),

        // ── State ────────────────────────────────────────────────────────
        (Method::Get, "/network") => handlers::network::handle_network(&query, &state),
        (Method::Get, "/progress") => handlers::network::handle_progress(&state),

        // ── Train ────────────────────────────────────────────────────────
        (Method::Post, "/train/start") => handlers::train::handle_start(&query, &state),
        (Method::Post, "/train/stop") => handlers::train::handle_stop(&state),
        (Method::Post, "/train/step") => handlers::train::handle_step(&query, &state),

        // ── Test ─────────────────────────────────────────────────────────
        (Method::Post, "/test") => handlers::test::handle_sample(&query, &state),
        (Method::Post, "/test/evaluate") => handlers::test::handle_evaluate(&state),
        (Method::Post, "/predict") => handlers::predict::handle(&mut request, &state),

        // ── Model file ───────────────────────────────────────────────────
        (Method::Post, "/model/save") => handlers::models::handle_save(&state),
        (Method::Post, "/model/load") => handlers::models::handle_load(&state),
        (Method::Get, "/model/download") => handlers::models::handle_download(&state),

        // ── 404 ──────────────────────────────────────────────────────────
        _ => not_found(),
    };

    let _ = request.respond(response);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_finds_keys() {
        assert_eq!(query_param("count=5&weights=0", "weights"), Some("0"));
        assert_eq!(query_param("count=5", "index"), None);
        assert_eq!(query_param("", "count"), None);
    }
}
