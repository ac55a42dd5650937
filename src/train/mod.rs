pub mod epoch_stats;
pub mod evaluate;
pub mod history;
pub mod loop_fn;
pub mod progress;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::EpochStats;
pub use evaluate::{evaluate, Evaluation};
pub use history::ErrorHistory;
pub use loop_fn::{train_loop, TrainReport};
pub use progress::TrainingProgress;
pub use train_config::TrainConfig;
pub use trainer::{train_sample, train_step, StepOutcome};
