use std::path::PathBuf;
use std::sync::{atomic::AtomicBool, Arc, Mutex, MutexGuard};

use serde::Serialize;

use sigmoid_net::train::ErrorHistory;
use sigmoid_net::{Dataset, Network, TrainingProgress};

/// What the studio is doing with the network right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Idle,
    /// A background thread is stepping through the training set.
    Training,
    /// The last action ran a test sample or a user input forward.
    Testing,
}

/// Everything the studio serves, behind one lock.
///
/// The background trainer takes the lock for a short run of samples at a
/// time, so requests never observe a half-applied update.
pub struct StudioState {
    pub network: Network,
    pub progress: TrainingProgress,
    /// Epoch target for background training.
    pub epochs: u32,
    pub train_set: Option<Box<dyn Dataset + Send>>,
    pub test_set: Option<Box<dyn Dataset + Send>>,
    pub history: ErrorHistory,
    /// Next sample `POST /test` runs when no index is given.
    pub test_cursor: usize,
    pub model_path: PathBuf,
    pub mode: Mode,
    pub stop_flag: Option<Arc<AtomicBool>>,
    /// Last notification for the viewer ("Model saved", ...).
    pub message: Option<String>,
}

impl StudioState {
    pub fn new(network: Network, progress: TrainingProgress, epochs: u32, model_path: PathBuf) -> Self {
        StudioState {
            network,
            progress,
            epochs,
            train_set: None,
            test_set: None,
            history: ErrorHistory::default(),
            test_cursor: 0,
            model_path,
            mode: Mode::Idle,
            stop_flag: None,
            message: None,
        }
    }

    pub fn is_training(&self) -> bool {
        self.mode == Mode::Training
    }

    /// Samples in the training set, zero when none is loaded.
    pub fn train_count(&self) -> usize {
        self.train_set.as_ref().map(|ds| ds.count()).unwrap_or(0)
    }
}

/// Shared state type: an `Arc<Mutex<StudioState>>` passed to every handler.
pub type SharedState = Arc<Mutex<StudioState>>;

/// Locks the state, recovering the guard if a handler panicked while
/// holding it.
pub fn lock(state: &SharedState) -> MutexGuard<'_, StudioState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
