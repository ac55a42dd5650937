pub mod models;
pub mod network;
pub mod predict;
pub mod train;
