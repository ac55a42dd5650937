use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::loss::mse::MseLoss;
use crate::network::network::Network;

/// Forward-only pass over a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub samples: usize,
    /// Samples whose strongest output matches the one-hot target.
    pub correct: usize,
    pub mean_error: f32,
}

impl Evaluation {
    /// Fraction classified correctly, in `[0, 1]`.
    pub fn accuracy(&self) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        self.correct as f32 / self.samples as f32
    }
}

/// Runs every sample forward without touching the weights.
pub fn evaluate(network: &mut Network, dataset: &dyn Dataset) -> Result<Evaluation> {
    let samples = dataset.count();
    let mut correct = 0;
    let mut total_error = 0.0;

    for index in 0..samples {
        let input = dataset.get_input(index)?;
        let expected = dataset.get_output(index)?;
        let output = network.forward(&input)?;
        total_error += MseLoss::loss(output, &expected)?;
        if output.argmax() == expected.argmax() {
            correct += 1;
        }
    }

    let mean_error = if samples == 0 { 0.0 } else { total_error / samples as f32 };
    Ok(Evaluation { samples, correct, mean_error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::network::numeric_labels;

    #[test]
    fn evaluation_does_not_train() {
        let mut net = Network::new(&[2, 3, 2], numeric_labels(2)).unwrap();
        let before = net.layers().to_vec();
        let ds = InMemoryDataset::new(vec![vec![1.0, 0.0]; 4], vec![vec![1.0, 0.0]; 4]).unwrap();

        let eval = evaluate(&mut net, &ds).unwrap();
        assert_eq!(eval.samples, 4);
        assert!(eval.correct == 0 || eval.correct == 4);
        assert!(eval.mean_error > 0.0);
        for (a, b) in before.iter().zip(net.layers()) {
            assert_eq!(a.weights, b.weights);
            assert_eq!(a.biased, b.biased);
        }
    }

    #[test]
    fn empty_dataset_scores_zero() {
        let mut net = Network::new(&[2, 2], numeric_labels(2)).unwrap();
        let eval = evaluate(&mut net, &InMemoryDataset::default()).unwrap();
        assert_eq!(eval.samples, 0);
        assert_eq!(eval.accuracy(), 0.0);
    }
}
