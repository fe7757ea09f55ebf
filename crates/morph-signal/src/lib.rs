use std::sync::Arc;

use morph_core::Vectorizer;
use ndarray::Array1;
use rustfft::{num_complex::Complex64, Fft, FftPlanner};

/// Frequency-domain features with the phase deliberately discarded.
///
/// `forward` keeps only the real component of each FFT bin. This is not a
/// magnitude spectrum and there is no guaranteed inverse that recovers the
/// original window; the imaginary parts are dropped, never stored. The
/// fitted model's correctness is defined relative to this lossy feature.
pub struct SpectralVectorizer {
    window_size: usize,
    fft_forward: Arc<dyn Fft<f64>>,
    fft_inverse: Arc<dyn Fft<f64>>,
}

impl SpectralVectorizer {
    pub fn new(window_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            window_size,
            fft_forward: planner.plan_fft_forward(window_size),
            fft_inverse: planner.plan_fft_inverse(window_size),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl Vectorizer for SpectralVectorizer {
    fn forward(&self, window: &[f64]) -> Array1<f64> {
        debug_assert_eq!(window.len(), self.window_size);
        let mut buffer: Vec<Complex64> =
            window.iter().map(|&s| Complex64::new(s, 0.0)).collect();
        self.fft_forward.process(&mut buffer);
        Array1::from_iter(buffer.iter().map(|c| c.re))
    }

    /// Treats the vector as a zero-imaginary spectrum and returns the real
    /// part of the inverse transform. rustfft's inverse is unnormalized,
    /// hence the 1/W scale.
    fn inverse(&self, vector: &Array1<f64>) -> Vec<f64> {
        debug_assert_eq!(vector.len(), self.window_size);
        let mut buffer: Vec<Complex64> =
            vector.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.fft_inverse.process(&mut buffer);
        let scale = 1.0 / self.window_size as f64;
        buffer.iter().map(|c| c.re * scale).collect()
    }
}

/// Identity passthrough on raw samples.
pub struct RawVectorizer;

impl Vectorizer for RawVectorizer {
    fn forward(&self, window: &[f64]) -> Array1<f64> {
        Array1::from_iter(window.iter().copied())
    }

    fn inverse(&self, vector: &Array1<f64>) -> Vec<f64> {
        vector.to_vec()
    }
}
