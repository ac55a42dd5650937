//! Binary model format.
//!
//! ```text
//! i32  trained
//! i32  data_index
//! i32  layer_count
//! per layer:
//!   matrix  biased
//!   matrix  weights        (0x0 on the output layer)
//! matrix:
//!   i32  rows
//!   i32  cols
//!   f32  rows * cols values, row-major
//! ```
//!
//! Integers and floats use the host byte order and there is no header or
//! version tag, so files written by earlier builds of the trainer load
//! unchanged. Activations are not stored.

use std::io::{self, Read, Write};

use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;
use crate::train::progress::TrainingProgress;

/// Caps the up-front allocation for a matrix read from an untrusted header.
/// Larger matrices still load; they grow as values arrive.
const MAX_PREALLOC: usize = 1 << 20;

pub fn write_model<W: Write>(writer: &mut W, layers: &[Layer], progress: &TrainingProgress) -> Result<()> {
    write_count(writer, progress.trained as usize, "trained")?;
    write_count(writer, progress.data_index, "data_index")?;
    write_count(writer, layers.len(), "layer_count")?;

    for layer in layers {
        write_matrix(writer, &layer.biased)?;
        write_matrix(writer, &layer.weights)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the layers and progress counters. The caller is responsible for
/// checking that the layers form a valid chain.
pub fn read_model<R: Read>(reader: &mut R) -> Result<(Vec<Layer>, TrainingProgress)> {
    let trained = read_count(reader, "trained")?;
    let data_index = read_count(reader, "data_index")?;
    let layer_count = read_count(reader, "layer_count")?;
    if layer_count == 0 {
        return Err(NnError::corrupt("model has no layers"));
    }

    let trained = u32::try_from(trained)
        .map_err(|_| NnError::corrupt(format!("trained count {} out of range", trained)))?;

    let mut layers = Vec::with_capacity(layer_count.min(1024));
    for i in 0..layer_count {
        let biased = read_matrix(reader)?;
        let weights = read_matrix(reader)?;
        let layer = Layer::from_parts(biased, weights)
            .map_err(|e| NnError::corrupt(format!("layer {}: {}", i, e)))?;
        layers.push(layer);
    }

    Ok((layers, TrainingProgress { trained, data_index }))
}

fn write_count<W: Write>(writer: &mut W, value: usize, what: &str) -> Result<()> {
    let v = i32::try_from(value)
        .map_err(|_| NnError::InvalidDimension(format!("{} = {} does not fit in an i32", what, value)))?;
    writer.write_all(&v.to_ne_bytes())?;
    Ok(())
}

fn write_matrix<W: Write>(writer: &mut W, m: &Matrix) -> Result<()> {
    write_count(writer, m.rows(), "rows")?;
    write_count(writer, m.cols(), "cols")?;
    for v in m.data() {
        writer.write_all(&v.to_ne_bytes())?;
    }
    Ok(())
}

fn read_word<R: Read>(reader: &mut R, what: &str) -> Result<[u8; 4]> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => NnError::corrupt(format!("truncated while reading {}", what)),
        _ => NnError::Io(e),
    })?;
    Ok(buf)
}

/// A non-negative i32 from the stream.
fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let v = i32::from_ne_bytes(read_word(reader, what)?);
    usize::try_from(v).map_err(|_| NnError::corrupt(format!("negative {}: {}", what, v)))
}

fn read_matrix<R: Read>(reader: &mut R) -> Result<Matrix> {
    let rows = read_count(reader, "rows")?;
    let cols = read_count(reader, "cols")?;
    let len = rows
        .checked_mul(cols)
        .ok_or_else(|| NnError::corrupt(format!("matrix {}x{} is too large", rows, cols)))?;

    let mut data = Vec::with_capacity(len.min(MAX_PREALLOC));
    for _ in 0..len {
        data.push(f32::from_ne_bytes(read_word(reader, "matrix values")?));
    }
    Matrix::from_vec(rows, cols, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layers() -> Vec<Layer> {
        let mut input = Layer::new(2);
        let mut output = input.derive_next(1);
        input.weights = Matrix::from_vec(2, 1, vec![0.25, -0.75]).unwrap();
        output.biased = Matrix::row_vector(vec![0.5]);
        vec![input, output]
    }

    #[test]
    fn layout_matches_documented_format() {
        let mut buf = Vec::new();
        let progress = TrainingProgress { trained: 1, data_index: 7 };
        write_model(&mut buf, &sample_layers(), &progress).unwrap();

        // 3 header ints, layer 0: 2+2 ints + 2 floats, 2+2 ints + 2 floats,
        // layer 1: 2 ints + 1 float, 2 ints.
        assert_eq!(buf.len(), 4 * (3 + 2 + 2 + 2 + 2 + 2 + 1 + 2));
        assert_eq!(&buf[0..4], &1i32.to_ne_bytes());
        assert_eq!(&buf[4..8], &7i32.to_ne_bytes());
        assert_eq!(&buf[8..12], &2i32.to_ne_bytes());
    }

    #[test]
    fn read_restores_what_was_written() {
        let layers = sample_layers();
        let progress = TrainingProgress { trained: 4, data_index: 12 };
        let mut buf = Vec::new();
        write_model(&mut buf, &layers, &progress).unwrap();

        let (read, read_progress) = read_model(&mut buf.as_slice()).unwrap();
        assert_eq!(read_progress, progress);
        assert_eq!(read.len(), 2);
        for (a, b) in layers.iter().zip(&read) {
            assert_eq!(a.biased, b.biased);
            assert_eq!(a.weights, b.weights);
            assert_eq!(b.outputs, Matrix::zeros(1, a.size()));
        }
    }

    #[test]
    fn truncated_stream_is_corrupt() {
        let mut buf = Vec::new();
        write_model(&mut buf, &sample_layers(), &TrainingProgress::new()).unwrap();
        buf.truncate(buf.len() - 2);
        assert!(matches!(read_model(&mut buf.as_slice()), Err(NnError::CorruptModel(_))));
    }

    #[test]
    fn negative_dimensions_are_corrupt() {
        let mut buf = Vec::new();
        for v in [0i32, 0, 1, -1, 3] {
            buf.extend_from_slice(&v.to_ne_bytes());
        }
        assert!(matches!(read_model(&mut buf.as_slice()), Err(NnError::CorruptModel(_))));
    }

    #[test]
    fn zero_layers_are_corrupt() {
        let mut buf = Vec::new();
        for v in [0i32, 0, 0] {
            buf.extend_from_slice(&v.to_ne_bytes());
        }
        assert!(matches!(read_model(&mut buf.as_slice()), Err(NnError::CorruptModel(_))));
    }

    #[test]
    fn multi_row_biases_are_corrupt() {
        let mut buf = Vec::new();
        for v in [0i32, 0, 1, 2, 1] {
            buf.extend_from_slice(&v.to_ne_bytes());
        }
        buf.extend_from_slice(&0.0f32.to_ne_bytes());
        buf.extend_from_slice(&0.0f32.to_ne_bytes());
        buf.extend_from_slice(&0i32.to_ne_bytes());
        buf.extend_from_slice(&0i32.to_ne_bytes());
        assert!(matches!(read_model(&mut buf.as_slice()), Err(NnError::CorruptModel(_))));
    }
}
