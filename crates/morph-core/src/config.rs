use serde::{Deserialize, Serialize};

/// All tunables for fitting and inference.
///
/// Both strategies share this shape; the constructors below carry the
/// per-strategy defaults. Window size doubles as the feature dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Samples per window; also the feature vector length.
    pub window_size: usize,
    /// Energy gate: a training pair is dropped when either feature
    /// vector's self dot-product falls below this value.
    pub min_amplitude: f64,
    /// Added to the source matrix diagonal before the least-squares solve.
    pub damping: f64,
    /// Hidden layer widths for the nonlinear network.
    pub hidden_sizes: Vec<usize>,
    /// Starting damping coefficient for the curvature-aware optimizer.
    pub step_damping: f64,
    /// Largest sub-batch handed to one gradient evaluation.
    pub max_sub_batch: usize,
    /// Worker threads for per-sample gradient evaluation.
    pub concurrency: usize,
    /// Optimizer iterations before convergence may be declared.
    pub min_iterations: usize,
    pub max_iterations: usize,
    /// Seed for network parameter initialization.
    pub seed: u64,
}

impl ConversionConfig {
    /// Spectral linear regression defaults.
    pub fn spectral() -> Self {
        Self {
            window_size: 512,
            ..Self::base()
        }
    }

    /// Raw-sample nonlinear regression defaults.
    pub fn raw() -> Self {
        Self {
            window_size: 1024,
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            window_size: 512,
            min_amplitude: 1e-2,
            damping: 1e-5,
            hidden_sizes: vec![300, 500],
            step_damping: 0.1,
            max_sub_batch: 32,
            concurrency: 2,
            min_iterations: 5,
            max_iterations: 50,
            seed: 0x5eed,
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self::spectral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_defaults_differ_only_in_window_size() {
        let spectral = ConversionConfig::spectral();
        let raw = ConversionConfig::raw();
        assert_eq!(spectral.window_size, 512);
        assert_eq!(raw.window_size, 1024);
        assert_eq!(spectral.min_amplitude, raw.min_amplitude);
        assert_eq!(spectral.damping, raw.damping);
    }
}
