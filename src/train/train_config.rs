use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{atomic::AtomicBool, Arc};

use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`:      train until this many epochs are complete in total
/// - `log_every`:   emit a debug event every N samples; `0` disables it
/// - `checkpoint`:  if set, the model is saved there after every epoch
/// - `progress_tx`: optional channel; one `EpochStats` per completed
///                  epoch. A dropped receiver stops the loop.
/// - `stop_flag`:   optional atomic flag checked between samples
pub struct TrainConfig {
    pub epochs: u32,
    pub log_every: usize,
    pub checkpoint: Option<PathBuf>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// A config with no checkpoint, channel or stop flag.
    pub fn new(epochs: u32) -> Self {
        TrainConfig {
            epochs,
            log_every: 1000,
            checkpoint: None,
            progress_tx: None,
            stop_flag: None,
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(3)
    }
}
