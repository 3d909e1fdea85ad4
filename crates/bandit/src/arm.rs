//! Per-item LinUCB model: the design matrix `A` and response vector `b`.
//!
//! `A` is 27x27 and symmetric positive definite, so scoring factors it with
//! Cholesky (`A = L Lᵀ`) and solves instead of forming `A⁻¹`.

use crate::store::ArmRecord;
use chrono::Utc;
use nalgebra::{DMatrix, DVector};

/// Relative tolerance for the symmetry check on persisted matrices
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// In-memory form of one arm.
///
/// `A` starts as the identity and only ever gains outer products `x xᵀ`, so it
/// stays symmetric positive definite.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmState {
    a: DMatrix<f64>,
    b: DVector<f64>,
}

fn is_symmetric(a: &DMatrix<f64>) -> bool {
    let n = a.nrows();
    (0..n).all(|i| {
        ((i + 1)..n).all(|j| {
            let (x, y) = (a[(i, j)], a[(j, i)]);
            let scale = x.abs().max(y.abs()).max(1.0);
            (x - y).abs() <= SYMMETRY_TOLERANCE * scale
        })
    })
}

impl ArmState {
    /// Cold-start prior: `A = I`, `b = 0`
    pub fn seeded(dimensions: usize) -> Self {
        Self {
            a: DMatrix::identity(dimensions, dimensions),
            b: DVector::zeros(dimensions),
        }
    }

    /// Rebuild from a persisted record.
    ///
    /// Returns `None` when the record has the wrong shape, holds non-finite
    /// values, or its matrix is not symmetric positive definite.
    pub fn from_record(record: &ArmRecord, dimensions: usize) -> Option<Self> {
        if record.b.len() != dimensions
            || record.a.len() != dimensions
            || record.a.iter().any(|row| row.len() != dimensions)
        {
            return None;
        }
        if record.a.iter().flatten().chain(record.b.iter()).any(|v| !v.is_finite()) {
            return None;
        }

        let a = DMatrix::from_row_iterator(
            dimensions,
            dimensions,
            record.a.iter().flatten().copied(),
        );
        // Cholesky only reads the lower triangle
        if !is_symmetric(&a) {
            return None;
        }
        a.clone().cholesky()?;

        Some(Self {
            a,
            b: DVector::from_column_slice(&record.b),
        })
    }

    pub fn to_record(&self) -> ArmRecord {
        ArmRecord {
            a: self
                .a
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
            b: self.b.iter().copied().collect(),
            updated_at: Utc::now(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.b.len()
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    /// `A += x xᵀ`, `b += reward * x`
    pub fn apply(&mut self, x: &DVector<f64>, reward: f64) {
        self.a += x * x.transpose();
        self.b += x * reward;
    }

    /// Upper confidence bound `θ·x + alpha * sqrt(xᵀ A⁻¹ x)` with `θ = A⁻¹ b`.
    ///
    /// `None` only if `A` has lost positive definiteness.
    pub fn ucb(&self, x: &DVector<f64>, alpha: f64) -> Option<f64> {
        let factor = self.a.clone().cholesky()?;
        let theta = factor.solve(&self.b);
        let a_inv_x = factor.solve(x);

        let mean = theta.dot(x);
        let variance = x.dot(&a_inv_x).max(0.0);
        Some(mean + alpha * variance.sqrt())
    }
}
