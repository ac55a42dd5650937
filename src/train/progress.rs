use serde::{Deserialize, Serialize};

/// Where a training session stands: how many full passes over the dataset
/// are done and which sample comes next.
///
/// Owned by whoever drives training and passed into the step functions; it
/// is persisted next to the weights so a run can resume mid-dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingProgress {
    /// Completed epochs.
    pub trained: u32,
    /// Index of the next training sample.
    pub data_index: usize,
}

impl TrainingProgress {
    pub fn new() -> Self {
        TrainingProgress::default()
    }

    /// Share of the current epoch already consumed, in `[0, 1]`.
    pub fn fraction(&self, count: usize) -> f32 {
        if count == 0 {
            return 0.0;
        }
        (self.data_index.min(count) as f32) / count as f32
    }

    /// Moves the cursor past one sample. Returns `true` when that sample
    /// closed an epoch, in which case the cursor is back at zero.
    pub fn advance(&mut self, count: usize) -> bool {
        self.data_index += 1;
        if self.data_index >= count {
            self.data_index = 0;
            self.trained += 1;
            return true;
        }
        false
    }

    /// Brings a cursor that points past the dataset back to the start.
    ///
    /// A cursor equal to `count` comes from files saved right after the last
    /// sample, before the epoch was credited; it counts as a finished epoch.
    pub fn normalize(&mut self, count: usize) {
        if self.data_index == count && count > 0 {
            self.trained += 1;
        }
        if self.data_index >= count {
            self.data_index = 0;
        }
    }
}
