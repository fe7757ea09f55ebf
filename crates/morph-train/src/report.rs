use morph_core::Transform;
use morph_model::LinearModel;
use tracing::info;

use crate::pairs::TrainingPair;

/// Aggregate squared-error totals over one training set.
///
/// `baseline_error` measures doing nothing (source vs target);
/// `transformed_error` measures the fitted map's prediction vs target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorReport {
    pub target_energy: f64,
    pub baseline_error: f64,
    pub transformed_error: f64,
}

impl ErrorReport {
    /// Whether the fitted transform beats leaving the audio untouched.
    pub fn improved(&self) -> bool {
        self.transformed_error < self.baseline_error
    }
}

pub fn error_report(pairs: &[TrainingPair], model: &LinearModel) -> ErrorReport {
    let mut report = ErrorReport::default();
    for pair in pairs {
        report.target_energy += pair.target.dot(&pair.target);

        let baseline = &pair.source - &pair.target;
        report.baseline_error += baseline.dot(&baseline);

        let transformed = model.apply(&pair.source) - &pair.target;
        report.transformed_error += transformed.dot(&transformed);
    }
    info!(
        baseline = report.baseline_error,
        transformed = report.transformed_error,
        target_energy = report.target_energy,
        "training error totals"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn pair(source: &[f64], target: &[f64]) -> TrainingPair {
        TrainingPair {
            source: Array1::from_iter(source.iter().copied()),
            target: Array1::from_iter(target.iter().copied()),
        }
    }

    #[test]
    fn identity_model_makes_transformed_equal_baseline() {
        let model = LinearModel::new(Array2::eye(2));
        let pairs = vec![pair(&[1.0, 0.0], &[0.0, 1.0]), pair(&[0.5, 0.5], &[0.5, 0.5])];
        let report = error_report(&pairs, &model);
        assert_eq!(report.baseline_error, report.transformed_error);
        assert_eq!(report.target_energy, 1.5);
        assert!(!report.improved());
    }

    #[test]
    fn exact_model_drives_transformed_error_to_zero() {
        // target = 2 * source, modeled exactly.
        let model = LinearModel::new(Array2::eye(2) * 2.0);
        let pairs = vec![pair(&[0.3, -0.4], &[0.6, -0.8]), pair(&[0.1, 0.2], &[0.2, 0.4])];
        let report = error_report(&pairs, &model);
        assert!(report.transformed_error < 1e-12);
        assert!(report.baseline_error > 0.0);
        assert!(report.improved());
    }
}
