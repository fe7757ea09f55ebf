use morph_core::{ConversionConfig, MorphError, Result};
use morph_model::LinearModel;
use nalgebra::DMatrix;
use ndarray::Array2;
use tracing::info;

use crate::pairs::TrainingPair;

/// Solves the overdetermined system `A·X ≈ B` for `X`.
///
/// `A` arrives already regularized; a degenerate factorization is a
/// `Numeric` error, never silently zeroed.
pub trait LeastSquaresSolver {
    fn solve(&self, a: DMatrix<f64>, b: DMatrix<f64>) -> Result<DMatrix<f64>>;
}

/// Thin QR factorization followed by a per-column LU solve against the
/// triangular R factor.
pub struct QrSolver;

impl LeastSquaresSolver for QrSolver {
    fn solve(&self, a: DMatrix<f64>, b: DMatrix<f64>) -> Result<DMatrix<f64>> {
        let qr = a.qr();
        let qtb = qr.q().transpose() * b;
        let r = qr.r();
        let lu = r.lu();
        let mut solution = DMatrix::zeros(qtb.nrows(), qtb.ncols());
        for col in 0..qtb.ncols() {
            let rhs = qtb.column(col).into_owned();
            let x = lu.solve(&rhs).ok_or_else(|| {
                MorphError::Numeric("least-squares solve failed: R factor is singular".into())
            })?;
            solution.set_column(col, &x);
        }
        Ok(solution)
    }
}

/// Closed-form regularized linear fit between source and target feature
/// vectors: one matrix applied identically to every window.
pub struct LeastSquaresFitter<'a> {
    config: &'a ConversionConfig,
}

impl<'a> LeastSquaresFitter<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self { config }
    }

    pub fn fit(&self, pairs: &[TrainingPair]) -> Result<LinearModel> {
        self.fit_with(pairs, &QrSolver)
    }

    /// Deterministic given identical pair ordering.
    pub fn fit_with(
        &self,
        pairs: &[TrainingPair],
        solver: &dyn LeastSquaresSolver,
    ) -> Result<LinearModel> {
        let w = self.config.window_size;
        if pairs.len() < w {
            return Err(MorphError::InsufficientData(format!(
                "have {} usable training pairs, need at least {w}",
                pairs.len()
            )));
        }

        // Source vectors as rows of A, targets as rows of B.
        let mut a = DMatrix::from_fn(pairs.len(), w, |row, col| pairs[row].source[col]);
        let b = DMatrix::from_fn(pairs.len(), w, |row, col| pairs[row].target[col]);

        // Tikhonov-style damping keeps the factorization full rank.
        for i in 0..w.min(pairs.len()) {
            a[(i, i)] += self.config.damping;
        }

        info!(pairs = pairs.len(), window = w, "computing QR decomposition");
        let x = solver.solve(a, b)?;
        info!("assembling linear model");

        // X solves A·X ≈ B column-wise; the model applies row-wise, so
        // the matrix is the transpose of the solution.
        let matrix = Array2::from_shape_fn((w, w), |(i, j)| x[(j, i)]);
        Ok(LinearModel::new(matrix))
    }
}
