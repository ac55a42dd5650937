use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::progress::TrainingProgress;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::train_step;

/// Summary of one `train_loop` call.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    /// Samples trained on during this call.
    pub samples: usize,
    /// Epochs that finished during this call.
    pub epochs_completed: u32,
    /// Stats of the most recently finished epoch, if any finished.
    pub last_epoch: Option<EpochStats>,
    /// True when the stop flag or a dropped receiver ended the run early.
    pub stopped: bool,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains one sample at a time until `progress.trained` reaches
/// `config.epochs`, starting wherever `progress` points.
///
/// # Early termination
/// The loop returns early, with `stopped` set, if:
/// - `config.stop_flag` is set (checked before every sample), **or**
/// - the `progress_tx` receiver has been dropped.
///
/// Progress is updated in place, so a stopped run can be resumed by
/// calling again with the same `progress`.
pub fn train_loop(
    network: &mut Network,
    dataset: &dyn Dataset,
    progress: &mut TrainingProgress,
    config: &TrainConfig,
) -> Result<TrainReport> {
    let count = dataset.count();
    if count == 0 {
        return Err(NnError::Dataset("cannot train on an empty dataset".into()));
    }
    progress.normalize(count);

    let mut report = TrainReport { samples: 0, epochs_completed: 0, last_epoch: None, stopped: false };
    // Running error since the last debug event.
    let mut recent_error = 0.0f64;
    let mut recent_samples = 0usize;
    let mut epoch_error = 0.0f64;
    let mut epoch_samples = 0usize;
    let mut epoch_start = Instant::now();

    while progress.trained < config.epochs {
        if stop_requested(config) {
            report.stopped = true;
            break;
        }

        let outcome = train_step(network, dataset, progress)?;
        report.samples += 1;
        epoch_error += outcome.error as f64;
        epoch_samples += 1;
        recent_error += outcome.error as f64;
        recent_samples += 1;

        if config.log_every > 0 && report.samples % config.log_every == 0 {
            debug!(
                epoch = progress.trained,
                index = outcome.index,
                recent_error = (recent_error / recent_samples as f64) as f32,
                "training"
            );
            recent_error = 0.0;
            recent_samples = 0;
        }

        if !outcome.epoch_completed {
            continue;
        }

        // ── Epoch boundary ────────────────────────────────────────────────
        let stats = EpochStats {
            epoch: progress.trained,
            total_epochs: config.epochs,
            mean_error: (epoch_error / epoch_samples as f64) as f32,
            samples: epoch_samples,
            elapsed_ms: epoch_start.elapsed().as_millis() as u64,
        };
        info!(
            epoch = stats.epoch,
            total = stats.total_epochs,
            mean_error = stats.mean_error,
            elapsed_ms = stats.elapsed_ms,
            "epoch complete"
        );
        report.epochs_completed += 1;
        report.last_epoch = Some(stats.clone());

        if let Some(ref path) = config.checkpoint {
            network.save(path, progress)?;
        }

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                report.stopped = true;
                break;
            }
        }

        epoch_error = 0.0;
        epoch_samples = 0;
        epoch_start = Instant::now();
    }

    Ok(report)
}

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .map(|flag| flag.load(Ordering::Relaxed))
        .unwrap_or(false)
}
