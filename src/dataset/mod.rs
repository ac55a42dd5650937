//! Sources of training samples.
//!
//! Training and evaluation only ever see the [`Dataset`] trait; the IDX
//! loader and the in-memory set are two providers of it.

pub mod idx;
pub mod memory;

use crate::error::Result;
use crate::math::matrix::Matrix;

pub use idx::IdxDataset;
pub use memory::InMemoryDataset;

/// Indexed (input, expected output) pairs.
pub trait Dataset {
    /// Number of samples.
    fn count(&self) -> usize;

    /// The `1 x input_width` input of sample `index`, scaled to `[0, 1]`.
    fn get_input(&self, index: usize) -> Result<Matrix>;

    /// The `1 x label_count` one-hot target of sample `index`.
    fn get_output(&self, index: usize) -> Result<Matrix>;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
