//! A small sigmoid multilayer perceptron.
//!
//! Dense `f32` matrices, a forward pass through a stack of sigmoid layers,
//! per-sample backpropagation with plain gradient descent, and a compact
//! binary model format. Training progress (`trained` epochs and the sample
//! cursor) is kept in [`TrainingProgress`], separate from the network's
//! parameters, and is stored in the model file next to the weights.

pub mod activation;
pub mod dataset;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use dataset::{Dataset, IdxDataset, InMemoryDataset};
pub use error::{NnError, Result};
pub use layers::dense::Layer;
pub use loss::mse::{error, MseLoss};
pub use math::matrix::Matrix;
pub use network::{Network, NetworkSpec, Prediction};
pub use optim::sgd::Sgd;
pub use train::{evaluate, train_loop, train_step, EpochStats, TrainConfig, TrainingProgress};
