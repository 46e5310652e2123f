//! Dense complex matrices for small registers.
//!
//! Registers in this crate never exceed a handful of qubits, so a plain
//! row-major `Vec<Complex64>` is all the linear algebra the simulator needs.

use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Complex zero.
pub const ZERO: Complex64 = Complex64::new(0.0, 0.0);
/// Complex one.
pub const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Most decimal places an f64 can carry; larger requests are clamped.
pub const MAX_DECIMALS: usize = 15;

/// Row-major dense matrix of complex numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Complex64>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = SimError;

    fn try_from(raw: RawMatrix) -> SimResult<Self> {
        if raw.rows.checked_mul(raw.cols) != Some(raw.data.len()) {
            return Err(SimError::Dimension(format!(
                "{} entries do not fill a {}x{} matrix",
                raw.data.len(),
                raw.rows,
                raw.cols
            )));
        }
        Ok(Self {
            rows: raw.rows,
            cols: raw.cols,
            data: raw.data,
        })
    }
}

impl Matrix {
    /// Create a `rows × cols` matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![ZERO; rows * cols],
        }
    }

    /// Create an `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, ONE);
        }
        m
    }

    /// Build a matrix from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<Complex64>>) -> SimResult<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(SimError::Dimension(format!(
                "row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                cols
            )));
        }
        let n_rows = rows.len();
        Ok(Self {
            rows: n_rows,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Build a matrix from real entries.
    pub fn from_real_rows(rows: &[&[f64]]) -> SimResult<Self> {
        Self::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|&x| Complex64::new(x, 0.0)).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Entry at `(r, c)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn get(&self, r: usize, c: usize) -> Complex64 {
        assert!(r < self.rows && c < self.cols, "matrix index out of bounds");
        self.data[r * self.cols + c]
    }

    /// Overwrite entry `(r, c)`.
    pub fn set(&mut self, r: usize, c: usize, value: Complex64) {
        assert!(r < self.rows && c < self.cols, "matrix index out of bounds");
        self.data[r * self.cols + c] = value;
    }

    /// Matrix product `self · other`.
    pub fn mul(&self, other: &Matrix) -> SimResult<Matrix> {
        if self.cols != other.rows {
            return Err(SimError::Dimension(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a == ZERO {
                    continue;
                }
                for j in 0..other.cols {
                    out.data[i * other.cols + j] += a * other.get(k, j);
                }
            }
        }
        Ok(out)
    }

    /// Kronecker (tensor) product `self ⊗ other`.
    pub fn kron(&self, other: &Matrix) -> Matrix {
        let rows = self.rows * other.rows;
        let cols = self.cols * other.cols;
        let mut out = Matrix::zeros(rows, cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                let a = self.get(i, j);
                for k in 0..other.rows {
                    for l in 0..other.cols {
                        out.set(i * other.rows + k, j * other.cols + l, a * other.get(k, l));
                    }
                }
            }
        }
        out
    }

    /// Sum of the diagonal.
    pub fn trace(&self) -> SimResult<Complex64> {
        if !self.is_square() {
            return Err(SimError::Dimension(format!(
                "trace of non-square {}x{} matrix",
                self.rows, self.cols
            )));
        }
        Ok((0..self.rows).map(|i| self.get(i, i)).sum())
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.set(j, i, self.get(i, j).conj());
            }
        }
        out
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&self, factor: Complex64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| x * factor).collect(),
        }
    }

    /// Largest absolute entry-wise difference to `other`.
    pub fn max_abs_diff(&self, other: &Matrix) -> Option<f64> {
        if self.rows != other.rows || self.cols != other.cols {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a - b).norm())
                .fold(0.0, f64::max),
        )
    }

    /// True when `U†U = I` within `tol`.
    pub fn is_unitary(&self, tol: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        match self.adjoint().mul(self) {
            Ok(product) => product
                .max_abs_diff(&Matrix::identity(self.rows))
                .map(|d| d <= tol)
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(4);
        for r in 0..self.rows {
            write!(f, "[")?;
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", format_complex(self.get(r, c), precision))?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

/// Render a complex number compactly, dropping a zero imaginary part.
pub fn format_complex(z: Complex64, precision: usize) -> String {
    let precision = precision.min(MAX_DECIMALS);
    let re = round_to(z.re, precision);
    let im = round_to(z.im, precision);
    if im == 0.0 {
        format!("{:.*}", precision, re + 0.0)
    } else if re == 0.0 {
        format!("{:.*}j", precision, im)
    } else {
        let sign = if im < 0.0 { '-' } else { '+' };
        format!("{:.*}{}{:.*}j", precision, re, sign, precision, im.abs())
    }
}

/// Round `x` to `decimals` places, at most [`MAX_DECIMALS`].
pub fn round_to(x: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals.min(MAX_DECIMALS) as i32);
    let rounded = (x * factor).round() / factor;
    // Normalise negative zero so that comparisons and output stay stable.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
