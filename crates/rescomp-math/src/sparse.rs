//! Sparse matrix support for reservoir weight analysis
//!
//! The reservoir builder materializes its recurrent weight matrix only
//! transiently, to estimate the dominant eigenvalue. Connectivity is
//! sparse (typical densities are a few percent), so the matrix is kept
//! in Compressed Sparse Row form.

use crate::{Float, MathError, Result};

/// Compressed Sparse Row (CSR) matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    /// Non-zero values
    values: Vec<Float>,
    /// Column index for each value
    column_indices: Vec<usize>,
    /// Start offset of each row (len == rows + 1)
    row_pointers: Vec<usize>,
    rows: usize,
    cols: usize,
}

impl SparseMatrix {
    /// Create an empty matrix with the given dimensions
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            values: Vec::new(),
            column_indices: Vec::new(),
            row_pointers: vec![0; rows + 1],
            rows,
            cols,
        }
    }

    /// Build a matrix from (row, col, value) triplets.
    ///
    /// Triplets may arrive in any order; duplicate coordinates are not
    /// merged and must not be passed in.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        triplets: &[(usize, usize, Float)],
    ) -> Result<Self> {
        let mut matrix = Self::zeros(rows, cols);

        let mut row_counts = vec![0usize; rows];
        for &(row, col, _) in triplets {
            if row >= rows {
                return Err(MathError::IndexOutOfBounds { index: row, len: rows });
            }
            if col >= cols {
                return Err(MathError::IndexOutOfBounds { index: col, len: cols });
            }
            row_counts[row] += 1;
        }

        let mut cumsum = 0;
        for (i, &count) in row_counts.iter().enumerate() {
            matrix.row_pointers[i] = cumsum;
            cumsum += count;
        }
        matrix.row_pointers[rows] = cumsum;

        matrix.values.resize(triplets.len(), 0.0);
        matrix.column_indices.resize(triplets.len(), 0);

        let mut row_positions = matrix.row_pointers[..rows].to_vec();
        for &(row, col, value) in triplets {
            let pos = row_positions[row];
            matrix.values[pos] = value;
            matrix.column_indices[pos] = col;
            row_positions[row] += 1;
        }

        Ok(matrix)
    }

    /// Matrix dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored non-zero elements
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Element at (row, col); implicit zeros return 0.0
    pub fn get(&self, row: usize, col: usize) -> Result<Float> {
        if row >= self.rows || col >= self.cols {
            return Err(MathError::IndexOutOfBounds {
                index: row * self.cols + col,
                len: self.rows * self.cols,
            });
        }
        for i in self.row_pointers[row]..self.row_pointers[row + 1] {
            if self.column_indices[i] == col {
                return Ok(self.values[i]);
            }
        }
        Ok(0.0)
    }

    /// Matrix-vector product (SpMV)
    pub fn multiply_vector(&self, x: &[Float]) -> Result<Vec<Float>> {
        if x.len() != self.cols {
            return Err(MathError::DimensionMismatch {
                expected: self.cols,
                got: x.len(),
            });
        }

        let mut result = vec![0.0; self.rows];
        for row in 0..self.rows {
            let start = self.row_pointers[row];
            let end = self.row_pointers[row + 1];
            let mut acc = 0.0;
            for i in start..end {
                acc += self.values[i] * x[self.column_indices[i]];
            }
            result[row] = acc;
        }
        Ok(result)
    }

    /// Scale every stored value by a scalar
    pub fn scale(&mut self, scalar: Float) {
        for value in &mut self.values {
            *value *= scalar;
        }
    }

    /// Iterator over the non-zero (column, value) pairs of one row
    pub fn row_iter(&self, row: usize) -> impl Iterator<Item = (usize, Float)> + '_ {
        let start = self.row_pointers[row];
        let end = self.row_pointers[row + 1];
        (start..end).map(move |i| (self.column_indices[i], self.values[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_triplets() {
        let matrix = SparseMatrix::from_triplets(
            3,
            3,
            &[(0, 0, 1.0), (1, 1, 2.0), (2, 2, 3.0), (0, 2, -0.5)],
        )
        .unwrap();

        assert_eq!(matrix.shape(), (3, 3));
        assert_eq!(matrix.nnz(), 4);
        assert_eq!(matrix.get(0, 0).unwrap(), 1.0);
        assert_eq!(matrix.get(0, 2).unwrap(), -0.5);
        assert_eq!(matrix.get(0, 1).unwrap(), 0.0);
        assert_eq!(matrix.get(2, 2).unwrap(), 3.0);
    }

    #[test]
    fn test_triplet_bounds_check() {
        let result = SparseMatrix::from_triplets(2, 2, &[(2, 0, 1.0)]);
        assert!(result.is_err());

        let result = SparseMatrix::from_triplets(2, 2, &[(0, 5, 1.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_multiply_vector() {
        let matrix =
            SparseMatrix::from_triplets(2, 3, &[(0, 0, 1.0), (0, 2, 3.0), (1, 1, 2.0)]).unwrap();

        let result = matrix.multiply_vector(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(result, vec![10.0, 4.0]);

        let bad = matrix.multiply_vector(&[1.0, 2.0]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_scale() {
        let mut matrix =
            SparseMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (1, 1, -4.0)]).unwrap();
        matrix.scale(0.5);
        assert_eq!(matrix.get(0, 0).unwrap(), 1.0);
        assert_eq!(matrix.get(1, 1).unwrap(), -2.0);
    }

    #[test]
    fn test_row_iter() {
        let matrix =
            SparseMatrix::from_triplets(2, 3, &[(0, 1, 1.5), (0, 2, 2.5), (1, 0, 3.5)]).unwrap();

        let row0: Vec<_> = matrix.row_iter(0).collect();
        assert_eq!(row0, vec![(1, 1.5), (2, 2.5)]);
        let row1: Vec<_> = matrix.row_iter(1).collect();
        assert_eq!(row1, vec![(0, 3.5)]);
    }
}
