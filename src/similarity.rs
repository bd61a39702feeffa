//! Pairwise cosine similarity between embedding batches.

use crate::embedding::Embedding;
use crate::error::{Result, SpanEvalError};

/// Norm substituted for an exactly-zero row norm.
///
/// Dividing a zero vector by this leaves it zero, so any similarity against
/// it is `0.0` instead of NaN.
pub const NORM_EPSILON: f32 = 1e-12;

/// Euclidean norm of a vector, with zero replaced by [`NORM_EPSILON`].
fn safe_norm(v: &[f32]) -> f32 {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 { NORM_EPSILON } else { norm }
}

/// Scale a vector to unit length (zero vectors stay zero).
fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = safe_norm(v);
    v.iter().map(|x| x / norm).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Check that every row of `batch` has `expected` components.
fn check_dimension(batch: &[Embedding], expected: usize) -> Result<()> {
    match batch.iter().find(|row| row.len() != expected) {
        Some(row) => Err(SpanEvalError::DimensionMismatch {
            expected,
            found: row.len(),
        }),
        None => Ok(()),
    }
}

/// Compute cosine similarity between two vectors.
///
/// Uses the same zero-norm guard as [`SimilarityMatrix::compute`].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(SpanEvalError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(dot(&normalize(a), &normalize(b)))
}

/// Row-major table of cosine similarities.
///
/// Rows are indexed by the first batch passed to [`compute`](Self::compute),
/// columns by the second. A matrix with zero rows or zero columns means no
/// comparison was possible.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute the `|a| x |b|` cosine similarity matrix.
    ///
    /// Each row of both batches is scaled to unit length first; a row whose
    /// norm is exactly zero is divided by [`NORM_EPSILON`] instead. An empty
    /// batch on either side gives a matrix with that dimension zero.
    ///
    /// Fails with [`SpanEvalError::DimensionMismatch`] if the rows do not all
    /// share one dimension.
    pub fn compute(a: &[Embedding], b: &[Embedding]) -> Result<Self> {
        let dim = a.first().or_else(|| b.first()).map(Vec::len).unwrap_or(0);
        check_dimension(a, dim)?;
        check_dimension(b, dim)?;

        let a_norm: Vec<Vec<f32>> = a.iter().map(|row| normalize(row)).collect();
        let b_norm: Vec<Vec<f32>> = b.iter().map(|row| normalize(row)).collect();

        let mut values = Vec::with_capacity(a.len() * b.len());
        for row in &a_norm {
            for col in &b_norm {
                values.push(dot(row, col));
            }
        }

        Ok(Self {
            rows: a.len(),
            cols: b.len(),
            values,
        })
    }

    /// Number of rows (first batch).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (second batch).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Similarity between row `i` and column `j`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        self.values[i * self.cols + j]
    }

    /// All similarities of row `i`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over all entries of column `j`.
    pub fn column(&self, j: usize) -> impl Iterator<Item = f32> + '_ {
        (0..self.rows).map(move |i| self.values[i * self.cols + j])
    }

    /// Maximum of each row; empty if the matrix has no columns.
    pub fn row_max(&self) -> Vec<f32> {
        if self.cols == 0 {
            return Vec::new();
        }
        (0..self.rows)
            .map(|i| self.row(i).iter().copied().fold(f32::NEG_INFINITY, f32::max))
            .collect()
    }

    /// Maximum of each column; empty if the matrix has no rows.
    pub fn col_max(&self) -> Vec<f32> {
        if self.rows == 0 {
            return Vec::new();
        }
        (0..self.cols)
            .map(|j| self.column(j).fold(f32::NEG_INFINITY, f32::max))
            .collect()
    }

    /// The transposed matrix.
    pub fn transpose(&self) -> Self {
        let mut values = Vec::with_capacity(self.values.len());
        for j in 0..self.cols {
            values.extend(self.column(j));
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            values,
        }
    }
}

/// Arithmetic mean, accumulated in `f64`. `None` for an empty slice.
pub(crate) fn mean(values: &[f32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
}
