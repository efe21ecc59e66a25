//! Dense symmetric pairwise matrices over a corpus index space.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::Result;
use super::similarity::Metric;

/// A cell whose metric was undefined and was recorded as `+inf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndefinedPair {
    pub i: usize,
    pub j: usize,
    pub reason: String,
}

/// Square matrix, row-major, with an explicit dimension.
///
/// Symmetric with the metric's identity value on the diagonal. Entries are
/// finite except for pairs listed in `undefined`, which hold `+inf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseMatrix {
    pub metric: Metric,
    size: usize,
    values: Vec<f64>,
    undefined: Vec<UndefinedPair>,
}

impl PairwiseMatrix {
    /// Compute the upper triangle with `cell(i, j)` for `i < j` in parallel and
    /// mirror it. Failed cells become `+inf` and are logged.
    pub fn build<F>(metric: Metric, size: usize, cell: F) -> Self
    where
        F: Fn(usize, usize) -> Result<f64> + Sync,
    {
        let rows: Vec<Vec<(usize, Result<f64>)>> = (0..size)
            .into_par_iter()
            .map(|i| ((i + 1)..size).map(|j| (j, cell(i, j))).collect())
            .collect();

        let mut values = vec![0.0; size * size];
        for i in 0..size {
            values[i * size + i] = metric.identity();
        }

        let mut undefined = Vec::new();
        for (i, row) in rows.into_iter().enumerate() {
            for (j, outcome) in row {
                let value = match outcome {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(metric = %metric, i, j, error = %e, "pairwise value undefined, recording +inf");
                        undefined.push(UndefinedPair {
                            i,
                            j,
                            reason: e.to_string(),
                        });
                        f64::INFINITY
                    }
                };
                values[i * size + j] = value;
                values[j * size + i] = value;
            }
        }

        Self {
            metric,
            size,
            values,
            undefined,
        }
    }

    /// Build from explicit rows. Rows must be square; symmetry is not checked.
    pub fn from_rows(metric: Metric, rows: Vec<Vec<f64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        Some(Self {
            metric,
            size,
            values: rows.into_iter().flatten().collect(),
            undefined: Vec::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.size).map(|i| self.row(i).to_vec()).collect()
    }

    /// Values strictly above the diagonal, row by row.
    pub fn upper_triangle(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.size * self.size.saturating_sub(1) / 2);
        for i in 0..self.size {
            out.extend_from_slice(&self.row(i)[i + 1..]);
        }
        out
    }

    pub fn undefined_pairs(&self) -> &[UndefinedPair] {
        &self.undefined
    }

    pub fn has_undefined(&self) -> bool {
        !self.undefined.is_empty()
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        (0..self.size).all(|i| {
            ((i + 1)..self.size).all(|j| {
                let (a, b) = (self.get(i, j), self.get(j, i));
                a == b || (a - b).abs() <= tolerance
            })
        })
    }

    /// Largest finite off-diagonal value, if any.
    pub fn max_finite_off_diagonal(&self) -> Option<f64> {
        self.upper_triangle()
            .into_iter()
            .filter(|v| v.is_finite())
            .max_by(f64::total_cmp)
    }

    /// Rows with every non-finite cell replaced by `sentinel`.
    pub fn finite_rows(&self, sentinel: f64) -> Vec<Vec<f64>> {
        (0..self.size)
            .map(|i| {
                self.row(i)
                    .iter()
                    .map(|&v| if v.is_finite() { v } else { sentinel })
                    .collect()
            })
            .collect()
    }
}
