use std::ops::{Index, IndexMut};

use thiserror::Error;

/// Row-major 2D buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Array2<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Array2<T> {
    pub fn from_shape_vec(shape: (usize, usize), data: Vec<T>) -> Result<Self, ShapeError> {
        let (rows, cols) = shape;
        if data.len() != rows * cols {
            return Err(ShapeError {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Build a matrix from row vectors; every row must have `cols` entries.
    pub fn from_rows(rows: Vec<Vec<T>>, cols: usize) -> Result<Self, ShapeError> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for row in rows {
            if row.len() != cols {
                return Err(ShapeError {
                    rows: n,
                    cols,
                    len: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: n,
            cols,
        })
    }

    /// Empty matrix that keeps its column count.
    pub fn empty(cols: usize) -> Self {
        Self {
            data: Vec::new(),
            rows: 0,
            cols,
        }
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn row_slice(&self, row: usize) -> &[T] {
        let start = self.offset(row, 0);
        &self.data[start..start + self.cols]
    }

    pub fn row_slice_mut(&mut self, row: usize) -> &mut [T] {
        let start = self.offset(row, 0);
        let cols = self.cols;
        &mut self.data[start..start + cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |r| self.row_slice(r))
    }

    pub fn column(&self, col: usize) -> Vec<T>
    where
        T: Clone,
    {
        assert!(col < self.cols, "column index out of bounds");
        (0..self.rows).map(|row| self[(row, col)].clone()).collect()
    }

    /// Gather rows in the given order; indices may repeat.
    pub fn select_rows(&self, indices: &[usize]) -> Array2<T>
    where
        T: Clone,
    {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &row in indices {
            data.extend_from_slice(self.row_slice(row));
        }
        Array2 {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    pub fn mapv<U, F>(&self, mut f: F) -> Array2<U>
    where
        F: FnMut(&T) -> U,
    {
        Array2 {
            data: self.data.iter().map(|v| f(v)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl<T> Index<(usize, usize)> for Array2<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let offset = self.offset(index.0, index.1);
        &self.data[offset]
    }
}

impl<T> IndexMut<(usize, usize)> for Array2<T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let offset = self.offset(index.0, index.1);
        &mut self.data[offset]
    }
}

#[derive(Debug, Clone, Error)]
#[error("invalid shape ({rows}, {cols}) for buffer of length {len}")]
pub struct ShapeError {
    rows: usize,
    cols: usize,
    len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Array2::from_rows(vec![vec![1.0, 2.0], vec![3.0]], 2);
        assert!(err.is_err());
    }

    #[test]
    fn select_rows_keeps_requested_order() {
        let m = Array2::from_shape_vec((3, 2), vec![1, 2, 3, 4, 5, 6]).unwrap();
        let s = m.select_rows(&[2, 0]);
        assert_eq!(s.shape(), (2, 2));
        assert_eq!(s.row_slice(0), &[5, 6]);
        assert_eq!(s.row_slice(1), &[1, 2]);
    }

    #[test]
    fn empty_keeps_columns() {
        let m: Array2<f64> = Array2::empty(4);
        assert!(m.is_empty());
        assert_eq!(m.ncols(), 4);
        assert_eq!(m.select_rows(&[]).ncols(), 4);
    }
}
