use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²). Zero for empty inputs.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f32> {
        if predicted.is_empty() {
            return Ok(0.0);
        }
        let mut diff = predicted.subtract(expected)?;
        Ok(diff.square().sum() / predicted.len() as f32)
    }

    /// Output-layer delta: predicted - expected.
    ///
    /// The constant factor of the true MSE gradient is folded into the
    /// learning rate, and the output sigmoid's slope is not applied.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        if predicted.shape() != expected.shape() {
            return Err(NnError::shape_mismatch("backprop", predicted.shape(), expected.shape()));
        }
        predicted.subtract(expected)
    }
}

/// Mean squared error between a network output and its target.
pub fn error(output: &Matrix, expected: &Matrix) -> Result<f32> {
    MseLoss::loss(output, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_is_mean_of_squares() {
        let p = Matrix::row_vector(vec![1.0, 0.0, 0.5, 0.5]);
        let e = Matrix::row_vector(vec![0.0, 0.0, 0.5, 1.5]);
        assert!((error(&p, &e).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn derivative_is_plain_difference() {
        let p = Matrix::row_vector(vec![0.75, 0.25]);
        let e = Matrix::row_vector(vec![1.0, 0.0]);
        assert_eq!(MseLoss::derivative(&p, &e).unwrap().data(), &[-0.25, 0.25]);
    }

    #[test]
    fn mismatched_targets_are_rejected() {
        let p = Matrix::zeros(1, 3);
        let e = Matrix::zeros(1, 2);
        assert!(matches!(error(&p, &e), Err(NnError::ShapeMismatch { .. })));
        assert!(matches!(
            MseLoss::derivative(&p, &e),
            Err(NnError::ShapeMismatch { op: "backprop", .. })
        ));
    }
}
