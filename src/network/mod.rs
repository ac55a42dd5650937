pub mod codec;
pub mod network;
pub mod spec;

pub use network::{numeric_labels, Network, Prediction};
pub use spec::NetworkSpec;
