use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// One stage of the network.
///
/// `weights` bridges this layer to its successor: it is
/// `outputs.cols() x next.outputs.cols()`, and stays empty on the output
/// layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub outputs: Matrix,
    pub biased: Matrix,
    pub weights: Matrix,
}

impl Layer {
    /// A layer of `neuron_count` zeroed activations and biases, not yet
    /// connected to anything.
    pub fn new(neuron_count: usize) -> Layer {
        Layer {
            outputs: Matrix::zeros(1, neuron_count),
            biased: Matrix::zeros(1, neuron_count),
            weights: Matrix::empty(),
        }
    }

    /// Rebuilds a layer from persisted biases and weights. Activations are
    /// not stored, so they start at zero.
    pub fn from_parts(biased: Matrix, weights: Matrix) -> Result<Layer> {
        if biased.rows() != 1 {
            return Err(NnError::InvalidDimension(format!(
                "biases must be a single row, got {}x{}",
                biased.rows(),
                biased.cols()
            )));
        }
        Ok(Layer {
            outputs: Matrix::zeros(1, biased.cols()),
            biased,
            weights,
        })
    }

    /// Number of neurons.
    pub fn size(&self) -> usize {
        self.outputs.cols()
    }

    /// Creates the successor layer and sizes this layer's weights to feed it.
    pub fn derive_next(&mut self, neuron_count: usize) -> Layer {
        self.weights = Matrix::zeros(self.size(), neuron_count);
        Layer::new(neuron_count)
    }

    /// `current.outputs = sigmoid(previous.outputs . previous.weights + current.biased)`
    pub fn forward(current: &mut Layer, previous: &Layer) -> Result<()> {
        let mut z = previous.outputs.matmul(&previous.weights)?;
        z.add_inplace(&current.biased)?.sigmoid();
        current.outputs = z;
        Ok(())
    }

    pub fn parameter_count(&self) -> usize {
        self.biased.len() + self.weights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_next_sizes_the_bridge() {
        let mut input = Layer::new(3);
        let hidden = input.derive_next(4);
        assert_eq!(input.weights.shape(), (3, 4));
        assert_eq!(hidden.outputs.shape(), (1, 4));
        assert_eq!(hidden.biased.shape(), (1, 4));
        assert!(hidden.weights.is_empty());
    }

    #[test]
    fn forward_applies_weights_bias_and_sigmoid() {
        let mut prev = Layer::new(2);
        let mut curr = prev.derive_next(1);
        prev.outputs = Matrix::row_vector(vec![1.0, 2.0]);
        prev.weights = Matrix::from_vec(2, 1, vec![0.5, -0.25]).unwrap();
        curr.biased = Matrix::row_vector(vec![0.5]);

        Layer::forward(&mut curr, &prev).unwrap();

        // 1*0.5 + 2*(-0.25) + 0.5 = 0.5
        let expected = 1.0 / (1.0 + (-0.5f32).exp());
        assert!((curr.outputs.get(0, 0).unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn forward_reports_broken_bridge() {
        let prev = Layer::new(2);
        let mut curr = Layer::new(2);
        assert!(matches!(
            Layer::forward(&mut curr, &prev),
            Err(NnError::ShapeMismatch { op: "matmul", .. })
        ));
    }

    #[test]
    fn from_parts_zeroes_outputs() {
        let layer = Layer::from_parts(Matrix::row_vector(vec![0.1, 0.2]), Matrix::empty()).unwrap();
        assert_eq!(layer.outputs, Matrix::zeros(1, 2));
        assert!(Layer::from_parts(Matrix::zeros(2, 2), Matrix::empty()).is_err());
    }
}
