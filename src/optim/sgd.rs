use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Plain stochastic gradient descent: `param -= learning_rate * grad`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one update to `param` without allocating.
    pub fn step(&self, param: &mut Matrix, grad: &Matrix) -> Result<()> {
        if param.shape() != grad.shape() {
            return Err(NnError::shape_mismatch("sgd step", param.shape(), grad.shape()));
        }
        for (p, g) in param.data_mut().iter_mut().zip(grad.data()) {
            *p -= self.learning_rate * g;
        }
        Ok(())
    }
}

impl Default for Sgd {
    fn default() -> Self {
        Sgd::new(0.01)
    }
}
