use crate::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::loss::mse::MseLoss;
use crate::network::network::Network;
use crate::train::progress::TrainingProgress;

/// What one training step did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Index of the sample that was trained on.
    pub index: usize,
    /// Mean squared error of the output before the update.
    pub error: f32,
    /// Whether this sample closed an epoch.
    pub epoch_completed: bool,
}

/// Forward pass, error, and backprop on one sample. Returns the error
/// measured before the weights moved.
pub fn train_sample(network: &mut Network, dataset: &dyn Dataset, index: usize) -> Result<f32> {
    let input = dataset.get_input(index)?;
    let expected = dataset.get_output(index)?;

    let output = network.forward(&input)?;
    let error = MseLoss::loss(output, &expected)?;
    network.backprop(&expected)?;
    Ok(error)
}

/// Trains on the sample under the cursor and advances it, wrapping to the
/// start and counting an epoch at the end of the dataset.
pub fn train_step(
    network: &mut Network,
    dataset: &dyn Dataset,
    progress: &mut TrainingProgress,
) -> Result<StepOutcome> {
    let count = dataset.count();
    if count == 0 {
        return Err(NnError::Dataset("cannot train on an empty dataset".into()));
    }
    progress.normalize(count);

    let index = progress.data_index;
    let error = train_sample(network, dataset, index)?;
    let epoch_completed = progress.advance(count);
    Ok(StepOutcome { index, error, epoch_completed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::network::numeric_labels;

    fn tiny() -> (Network, InMemoryDataset) {
        let net = Network::new(&[2, 2], numeric_labels(2)).unwrap();
        let ds = InMemoryDataset::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]],
        )
        .unwrap();
        (net, ds)
    }

    #[test]
    fn steps_walk_the_dataset_and_count_epochs() {
        let (mut net, ds) = tiny();
        let mut progress = TrainingProgress::new();

        let indices: Vec<usize> = (0..4)
            .map(|_| train_step(&mut net, &ds, &mut progress).unwrap().index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 0]);
        assert_eq!(progress, TrainingProgress { trained: 1, data_index: 1 });
    }

    #[test]
    fn last_sample_closes_the_epoch() {
        let (mut net, ds) = tiny();
        let mut progress = TrainingProgress { trained: 0, data_index: 2 };
        let outcome = train_step(&mut net, &ds, &mut progress).unwrap();
        assert!(outcome.epoch_completed);
        assert!(outcome.error > 0.0);
        assert_eq!(progress.data_index, 0);
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let (mut net, _) = tiny();
        let empty = InMemoryDataset::default();
        let mut progress = TrainingProgress::new();
        assert!(matches!(train_step(&mut net, &empty, &mut progress), Err(NnError::Dataset(_))));
    }

    #[test]
    fn wrong_sample_width_propagates() {
        let (mut net, _) = tiny();
        let wide = InMemoryDataset::new(vec![vec![0.0; 3]], vec![vec![1.0, 0.0]]).unwrap();
        assert!(matches!(train_sample(&mut net, &wide, 0), Err(NnError::ShapeMismatch { .. })));
    }
}
