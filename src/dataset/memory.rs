use crate::dataset::Dataset;
use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Samples held as plain vectors. Handy for toy problems and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    inputs: Vec<Vec<f32>>,
    outputs: Vec<Vec<f32>>,
}

impl InMemoryDataset {
    /// Every input must have the same width, every output the same width,
    /// and there must be one output per input.
    pub fn new(inputs: Vec<Vec<f32>>, outputs: Vec<Vec<f32>>) -> Result<InMemoryDataset> {
        if inputs.len() != outputs.len() {
            return Err(NnError::Dataset(format!(
                "{} inputs but {} outputs",
                inputs.len(),
                outputs.len()
            )));
        }
        check_uniform(&inputs, "input")?;
        check_uniform(&outputs, "output")?;
        Ok(InMemoryDataset { inputs, outputs })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.inputs.len() {
            return Err(NnError::IndexOutOfRange {
                row: index,
                col: 0,
                rows: self.inputs.len(),
                cols: 1,
            });
        }
        Ok(())
    }
}

fn check_uniform(rows: &[Vec<f32>], what: &str) -> Result<()> {
    if let Some(first) = rows.first() {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != first.len()) {
            return Err(NnError::Dataset(format!(
                "{} {} has width {}, expected {}",
                what,
                i,
                row.len(),
                first.len()
            )));
        }
    }
    Ok(())
}

impl Dataset for InMemoryDataset {
    fn count(&self) -> usize {
        self.inputs.len()
    }

    fn get_input(&self, index: usize) -> Result<Matrix> {
        self.check_index(index)?;
        Ok(Matrix::row_vector(self.inputs[index].clone()))
    }

    fn get_output(&self, index: usize) -> Result<Matrix> {
        self.check_index(index)?;
        Ok(Matrix::row_vector(self.outputs[index].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_rows_as_vectors() {
        let ds = InMemoryDataset::new(vec![vec![0.0, 1.0], vec![1.0, 0.0]], vec![vec![1.0], vec![0.0]]).unwrap();
        assert_eq!(ds.count(), 2);
        assert_eq!(ds.get_input(1).unwrap().data(), &[1.0, 0.0]);
        assert_eq!(ds.get_output(0).unwrap().shape(), (1, 1));
        assert!(matches!(ds.get_input(2), Err(NnError::IndexOutOfRange { row: 2, .. })));
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(InMemoryDataset::new(vec![vec![0.0], vec![0.0, 1.0]], vec![vec![1.0], vec![1.0]]).is_err());
        assert!(InMemoryDataset::new(vec![vec![0.0]], vec![]).is_err());
    }
}
