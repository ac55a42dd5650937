use serde::{Deserialize, Serialize};

/// Per-epoch statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the loop
/// sends one `EpochStats` value each time an epoch completes. Receivers (the
/// studio, for instance) use it to drive progress displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Completed epochs after this one, counting those from earlier runs.
    pub epoch: u32,
    /// Epoch target of the run.
    pub total_epochs: u32,
    /// Mean per-sample error over the samples trained in this run during
    /// the epoch. A resumed epoch only covers the samples after the cursor.
    pub mean_error: f32,
    /// Samples that contributed to `mean_error`.
    pub samples: usize,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
}
