//! Square row-major integer matrix.
use crate::{Error, Result};
use std::fmt;

/// Owned `dim x dim` buffer of `i32`, row-major.
pub struct Matrix {
    dim: usize,
    data: Vec<i32>,
}

impl Matrix {
    fn with_elements<F>(dim: usize, element: F) -> Result<Matrix>
    where
        F: Fn(usize, usize) -> i32,
    {
        if dim < 1 {
            return Err(Error::InvalidDimension);
        }
        let mut data = Vec::new();
        data.try_reserve_exact(dim * dim)?;
        for row in 0..dim {
            for col in 0..dim {
                data.push(element(row, col));
            }
        }
        Ok(Matrix { dim, data })
    }

    /// Matrix filled with zeros.
    pub fn zeros(dim: usize) -> Result<Matrix> {
        Matrix::with_elements(dim, |_, _| 0)
    }

    /// Matrix where element (r, c) holds `r*dim + c`.
    pub fn sequential(dim: usize) -> Result<Matrix> {
        Matrix::with_elements(dim, |row, col| (row * dim + col) as i32)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.data[row * self.dim + col]
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.data
    }
}

impl fmt::Display for Matrix {
    /// Rows of space-padded 3-wide elements, one row per line, with a
    /// trailing blank line after the matrix.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.dim {
            for col in 0..self.dim {
                write!(f, "{:3} ", self.get(row, col))?;
            }
            writeln!(f)?;
        }
        writeln!(f)
    }
}
