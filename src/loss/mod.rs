pub mod mse;

pub use mse::{error, MseLoss};
