use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info};

use sigmoid_net::{train_step, NnError, Result};

use crate::routes::{error_message, error_response, json_response, ok, query_param, HttpResponse};
use crate::state::{lock, Mode, SharedState, StudioState};

/// Samples trained per lock acquisition by the background trainer.
const CHUNK: usize = 64;
/// Upper bound for one `POST /train/step`.
const MAX_STEP: usize = 100_000;

/// POST /train/start[?epochs=N]
///
/// Spawns a background thread that trains until the epoch target is
/// reached or `/train/stop` is called.
pub fn handle_start(query: &str, state: &SharedState) -> HttpResponse {
    let mut st = lock(state);
    if st.train_set.is_none() {
        return error_message(409, "no training dataset loaded");
    }
    if st.is_training() {
        return ok(&json!({ "status": "already running" }));
    }
    if let Some(raw) = query_param(query, "epochs") {
        match raw.parse::<u32>() {
            Ok(epochs) => st.epochs = epochs,
            Err(_) => return error_message(400, "epochs must be a non-negative integer"),
        }
    }
    if st.progress.trained >= st.epochs {
        return error_message(409, &format!("already trained for {} epochs", st.progress.trained));
    }

    let flag = Arc::new(AtomicBool::new(false));
    st.stop_flag = Some(Arc::clone(&flag));
    st.mode = Mode::Training;
    st.message = None;
    info!(trained = st.progress.trained, target = st.epochs, "background training started");
    drop(st);

    let shared = Arc::clone(state);
    std::thread::spawn(move || run_training(shared, flag));
    json_response(202, &json!({ "status": "started" }))
}

/// POST /train/stop
pub fn handle_stop(state: &SharedState) -> HttpResponse {
    let mut st = lock(state);
    match st.stop_flag.take() {
        Some(flag) => {
            flag.store(true, Ordering::Relaxed);
            st.mode = Mode::Idle;
            info!(trained = st.progress.trained, index = st.progress.data_index, "training stopped");
            ok(&json!({ "status": "stopped" }))
        }
        None => ok(&json!({ "status": "not running" })),
    }
}

/// POST /train/step?count=N
///
/// Trains N samples (default 1) synchronously, ignoring the epoch target.
pub fn handle_step(query: &str, state: &SharedState) -> HttpResponse {
    let count = match query_param(query, "count").map(str::parse::<usize>) {
        None => 1,
        Some(Ok(n)) if (1..=MAX_STEP).contains(&n) => n,
        Some(_) => return error_message(400, &format!("count must be between 1 and {}", MAX_STEP)),
    };

    let mut guard = lock(state);
    if guard.is_training() {
        return error_message(409, "background training is running");
    }
    let st = &mut *guard;
    let Some(dataset) = st.train_set.as_deref() else {
        return error_message(409, "no training dataset loaded");
    };

    let mut last_error = None;
    for _ in 0..count {
        match train_step(&mut st.network, dataset, &mut st.progress) {
            Ok(outcome) => {
                st.history.push(outcome.error);
                last_error = Some(outcome.error);
            }
            Err(e) => return error_response(&e),
        }
    }

    ok(&json!({
        "trained": st.progress.trained,
        "data_index": st.progress.data_index,
        "last_error": last_error,
        "prediction": st.network.prediction(),
    }))
}

fn run_training(state: SharedState, stop: Arc<AtomicBool>) {
    loop {
        let done = background_chunk(&mut lock(&state), &stop);
        if done {
            return;
        }
        std::thread::yield_now();
    }
}

/// One locked slice of background training. Returns true when the
/// trainer should exit.
///
/// The stop flag is read under the lock: once `/train/stop` has taken the
/// lock and set it, this session never touches the state again.
fn background_chunk(st: &mut StudioState, stop: &AtomicBool) -> bool {
    if stop.load(Ordering::Relaxed) {
        return true;
    }
    match train_chunk(st, CHUNK) {
        Ok(false) => false,
        Ok(true) => {
            info!(trained = st.progress.trained, "training target reached");
            finish(st, "Model trained!".to_owned());
            true
        }
        Err(e) => {
            error!(error = %e, "background training failed");
            finish(st, format!("training failed: {}", e));
            true
        }
    }
}

fn finish(st: &mut StudioState, message: String) {
    st.mode = Mode::Idle;
    st.stop_flag = None;
    st.message = Some(message);
}

/// Trains up to `samples` samples toward the epoch target. Returns true
/// once the target is reached.
pub fn train_chunk(st: &mut StudioState, samples: usize) -> Result<bool> {
    let dataset = st
        .train_set
        .as_deref()
        .ok_or_else(|| NnError::Dataset("no training dataset loaded".into()))?;

    for _ in 0..samples {
        if st.progress.trained >= st.epochs {
            return Ok(true);
        }
        let outcome = train_step(&mut st.network, dataset, &mut st.progress)?;
        st.history.push(outcome.error);
        if outcome.epoch_completed {
            info!(epoch = st.progress.trained, total = st.epochs, "epoch complete");
        }
    }
    Ok(st.progress.trained >= st.epochs)
}
