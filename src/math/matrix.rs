use std::fmt;
use std::ops::Mul;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::sigmoid::sigmoid;
use crate::error::{NnError, Result, Shape};

/// Dense row-major matrix of `f32` values.
///
/// The dimensions are fixed at construction. In-place operations overwrite
/// the contents and return `&mut Self` so they chain; the pure operations
/// allocate a new matrix. Every binary operation requires exact shape
/// agreement and reports [`NnError::ShapeMismatch`] otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix", into = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

/// Wire form used by serde; validated on the way back in.
#[derive(Serialize, Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = NnError;

    fn try_from(raw: RawMatrix) -> Result<Matrix> {
        Matrix::from_vec(raw.rows, raw.cols, raw.data)
    }
}

impl From<Matrix> for RawMatrix {
    fn from(m: Matrix) -> RawMatrix {
        RawMatrix { rows: m.rows, cols: m.cols, data: m.data }
    }
}

impl Matrix {
    /// Allocates a `rows x cols` matrix with every element set to `fill`.
    pub fn new(rows: usize, cols: usize, fill: f32) -> Result<Matrix> {
        let len = rows.checked_mul(cols).ok_or_else(|| {
            NnError::InvalidDimension(format!("{}x{} overflows the address space", rows, cols))
        })?;
        Ok(Matrix { rows, cols, data: vec![fill; len] })
    }

    /// Zero matrix.
    ///
    /// # Panics
    /// Panics if `rows * cols` overflows; use [`Matrix::new`] for untrusted sizes.
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix { rows, cols, data: vec![0.0; rows * cols] }
    }

    /// The 0x0 matrix, used as the unused weights of an output layer.
    pub fn empty() -> Matrix {
        Matrix { rows: 0, cols: 0, data: Vec::new() }
    }

    /// Wraps an existing row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Matrix> {
        match rows.checked_mul(cols) {
            Some(len) if len == data.len() => Ok(Matrix { rows, cols, data }),
            _ => Err(NnError::InvalidDimension(format!(
                "{} values cannot fill a {}x{} matrix",
                data.len(), rows, cols
            ))),
        }
    }

    /// Builds a 1xN row vector.
    pub fn row_vector(values: Vec<f32>) -> Matrix {
        Matrix { rows: 1, cols: values.len(), data: values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of the values. The slice cannot change the length, so
    /// the shape invariant holds.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(NnError::IndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f32> {
        let i = self.offset(row, col)?;
        Ok(self.data[i])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        let i = self.offset(row, col)?;
        self.data[i] = value;
        Ok(())
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> Result<&[f32]> {
        if row >= self.rows {
            return Err(NnError::IndexOutOfRange {
                row,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    fn require_same_shape(&self, other: &Matrix, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(NnError::shape_mismatch(op, self.shape(), other.shape()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // In-place operations
    // ------------------------------------------------------------------

    pub fn fill(&mut self, value: f32) -> &mut Self {
        self.data.iter_mut().for_each(|x| *x = value);
        self
    }

    /// `self += other`
    pub fn add_inplace(&mut self, other: &Matrix) -> Result<&mut Self> {
        self.require_same_shape(other, "add")?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
        Ok(self)
    }

    /// `self -= other`
    pub fn sub_inplace(&mut self, other: &Matrix) -> Result<&mut Self> {
        self.require_same_shape(other, "subtract")?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a -= b;
        }
        Ok(self)
    }

    /// Multiplies every element by `value`.
    pub fn scale(&mut self, value: f32) -> &mut Self {
        self.data.iter_mut().for_each(|x| *x *= value);
        self
    }

    /// Element-wise (Hadamard) product, in place.
    pub fn hadamard_inplace(&mut self, other: &Matrix) -> Result<&mut Self> {
        self.require_same_shape(other, "hadamard")?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a *= b;
        }
        Ok(self)
    }

    pub fn square(&mut self) -> &mut Self {
        self.data.iter_mut().for_each(|x| *x *= *x);
        self
    }

    pub fn sigmoid(&mut self) -> &mut Self {
        self.data.iter_mut().for_each(|x| *x = sigmoid(*x));
        self
    }

    /// Fills with uniform noise in `[min, max)` from the thread-local RNG.
    pub fn randomize(&mut self, min: f32, max: f32) -> Result<&mut Self> {
        self.randomize_with(&mut rand::thread_rng(), min, max)
    }

    /// Fills with uniform noise in `[min, max)` drawn from `rng`.
    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R, min: f32, max: f32) -> Result<&mut Self> {
        // Written negated so NaN bounds are rejected as well.
        if !(max > min) {
            return Err(NnError::InvalidDimension(format!(
                "randomize range is empty: min {} must be below max {}",
                min, max
            )));
        }
        for x in self.data.iter_mut() {
            *x = rng.gen_range(min..max);
        }
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Pure operations
    // ------------------------------------------------------------------

    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        let mut res = self.clone();
        res.add_inplace(other)?;
        Ok(res)
    }

    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        let mut res = self.clone();
        res.sub_inplace(other)?;
        Ok(res)
    }

    pub fn scaled(&self, value: f32) -> Matrix {
        self.map(|x| x * value)
    }

    pub fn hadamard(&self, other: &Matrix) -> Result<Matrix> {
        let mut res = self.clone();
        res.hadamard_inplace(other)?;
        Ok(res)
    }

    /// Matrix product `self . other`.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(NnError::shape_mismatch("matmul", self.shape(), other.shape()));
        }

        let mut res = Matrix::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for c in 0..other.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.data[r * self.cols + k] * other.data[k * other.cols + c];
                }
                res.data[r * other.cols + c] = sum;
            }
        }
        Ok(res)
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                res.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f32) -> f32,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Flat index of the largest value, `None` for an empty matrix.
    pub fn argmax(&self) -> Option<usize> {
        self.data
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::empty()
    }
}

impl Mul<f32> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f32) -> Matrix {
        self.scaled(rhs)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for r in 0..self.rows {
            write!(f, "  ")?;
            for c in 0..self.cols {
                if c != 0 {
                    write!(f, ", ")?;
                }
                // Leave room for the sign so columns line up.
                let v = self.data[r * self.cols + c];
                if v >= 0.0 {
                    write!(f, " {:.6}", v)?;
                } else {
                    write!(f, "{:.6}", v)?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn m(rows: usize, cols: usize, data: &[f32]) -> Matrix {
        Matrix::from_vec(rows, cols, data.to_vec()).unwrap()
    }

    #[test]
    fn new_fills_every_element() {
        let a = Matrix::new(2, 3, 1.5).unwrap();
        assert_eq!(a.shape(), (2, 3));
        assert!(a.data().iter().all(|&x| x == 1.5));
    }

    #[test]
    fn new_rejects_overflowing_dimensions() {
        assert!(matches!(Matrix::new(usize::MAX, 2, 0.0), Err(NnError::InvalidDimension(_))));
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(matches!(
            Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0]),
            Err(NnError::InvalidDimension(_))
        ));
    }

    #[test]
    fn checked_access() {
        let mut a = Matrix::zeros(2, 2);
        a.set(1, 0, 4.0).unwrap();
        assert_eq!(a.get(1, 0).unwrap(), 4.0);
        assert_eq!(a.data(), &[0.0, 0.0, 4.0, 0.0]);
        assert!(matches!(a.get(2, 0), Err(NnError::IndexOutOfRange { row: 2, .. })));
        assert!(matches!(a.set(0, 5, 1.0), Err(NnError::IndexOutOfRange { col: 5, .. })));
    }

    #[test]
    fn rows_are_contiguous_slices() {
        let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(a.row(1).unwrap(), &[4.0, 5.0, 6.0]);
        assert!(matches!(a.row(2), Err(NnError::IndexOutOfRange { row: 2, rows: 2, .. })));
    }

    #[test]
    fn fill_overwrites_every_element() {
        let mut a = m(2, 2, &[1.0, -2.0, 3.0, 0.5]);
        a.fill(7.0).scale(2.0);
        assert_eq!(a.data(), &[14.0; 4]);
        assert_eq!(a.shape(), (2, 2));
    }

    #[test]
    fn add_requires_equal_shapes() {
        let mut a = Matrix::zeros(1, 3);
        let b = Matrix::zeros(3, 1);
        match a.add_inplace(&b) {
            Err(NnError::ShapeMismatch { left, right, .. }) => {
                assert_eq!(left, (1, 3));
                assert_eq!(right, (3, 1));
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn in_place_ops_chain() {
        let mut a = m(1, 3, &[1.0, -2.0, 3.0]);
        a.add_inplace(&m(1, 3, &[1.0, 1.0, 1.0])).unwrap().scale(2.0).square();
        assert_eq!(a.data(), &[16.0, 4.0, 64.0]);
    }

    #[test]
    fn matmul_known_product() {
        let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = m(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c.data(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn matmul_rejects_inner_mismatch() {
        let a = Matrix::zeros(2, 3);
        assert!(matches!(a.matmul(&a), Err(NnError::ShapeMismatch { op: "matmul", .. })));
    }

    #[test]
    fn transpose_swaps_dimensions() {
        let a = m(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = a.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn hadamard_and_subtract() {
        let a = m(1, 3, &[1.0, 2.0, 3.0]);
        let b = m(1, 3, &[2.0, 2.0, 2.0]);
        assert_eq!(a.hadamard(&b).unwrap().data(), &[2.0, 4.0, 6.0]);
        assert_eq!(a.subtract(&b).unwrap().data(), &[-1.0, 0.0, 1.0]);
        assert_eq!((&a * 3.0).data(), &[3.0, 6.0, 9.0]);
    }

    #[test]
    fn sum_and_argmax() {
        let a = m(2, 2, &[0.1, 0.9, 0.3, 0.2]);
        assert!((a.sum() - 1.5).abs() < 1e-6);
        assert_eq!(a.argmax(), Some(1));
        assert_eq!(Matrix::empty().argmax(), None);
    }

    #[test]
    fn sigmoid_of_zero_is_half() {
        let mut a = Matrix::zeros(1, 4);
        a.sigmoid();
        assert!(a.data().iter().all(|&x| x == 0.5));
    }

    #[test]
    fn randomize_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut a = Matrix::zeros(10, 10);
        a.randomize_with(&mut rng, -0.5, 0.5).unwrap();
        assert!(a.data().iter().all(|&x| (-0.5..0.5).contains(&x)));
    }

    #[test]
    fn randomize_rejects_empty_range() {
        let mut a = Matrix::zeros(2, 2);
        assert!(matches!(a.randomize(1.0, 1.0), Err(NnError::InvalidDimension(_))));
        assert!(matches!(a.randomize(1.0, -1.0), Err(NnError::InvalidDimension(_))));
    }

    #[test]
    fn serde_round_trip_validates_shape() {
        let a = m(2, 1, &[0.25, -1.0]);
        let json = serde_json::to_string(&a).unwrap();
        let back: Matrix = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);

        let bad = r#"{"rows":2,"cols":2,"data":[1.0]}"#;
        assert!(serde_json::from_str::<Matrix>(bad).is_err());
    }

    #[test]
    fn display_pads_positive_values() {
        let a = m(1, 2, &[1.0, -1.0]);
        assert_eq!(a.to_string(), "[\n   1.000000, -1.000000\n]");
    }
}
