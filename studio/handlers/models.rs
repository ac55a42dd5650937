use serde_json::json;
use tracing::info;

use sigmoid_net::NnError;

use crate::routes::{download_response, error_message, error_response, ok, HttpResponse};
use crate::state::{lock, SharedState};

/// POST /model/save: writes weights and progress to the model file.
pub fn handle_save(state: &SharedState) -> HttpResponse {
    let mut st = lock(state);
    if let Err(e) = st.network.save(&st.model_path, &st.progress) {
        return error_response(&e);
    }
    info!(path = %st.model_path.display(), trained = st.progress.trained, "model saved");
    st.message = Some("Model saved".to_owned());
    ok(&json!({ "saved": st.model_path.display().to_string(), "progress": st.progress }))
}

/// POST /model/load: replaces weights and progress from the model file.
/// The current network is kept if the file cannot be read.
pub fn handle_load(state: &SharedState) -> HttpResponse {
    let mut guard = lock(state);
    if guard.is_training() {
        return error_message(409, "stop training before loading a model");
    }
    let st = &mut *guard;
    match st.network.load(&st.model_path) {
        Ok(progress) => {
            st.progress = progress;
            st.history.clear();
            st.message = Some("Model loaded".to_owned());
            info!(path = %st.model_path.display(), topology = ?st.network.topology(), "model loaded");
            ok(&json!({
                "topology": st.network.topology(),
                "progress": st.progress,
            }))
        }
        Err(e) => error_response(&e),
    }
}

/// GET /model/download: the raw model file.
pub fn handle_download(state: &SharedState) -> HttpResponse {
    let path = lock(state).model_path.clone();
    match std::fs::read(&path) {
        Ok(bytes) => {
            let name: String = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("model")
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
                .collect();
            download_response(bytes, if name.is_empty() { "model" } else { &name })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => error_message(404, "model has not been saved yet"),
        Err(e) => error_response(&NnError::from(e)),
    }
}
