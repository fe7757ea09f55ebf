use ndarray::Array1;

use crate::window::{clip, windows};

/// A fitted model: maps one feature vector to one feature vector.
///
/// Implementations are pure functions of (parameters, input) with no
/// interior mutability, so a shared reference may be applied from any
/// number of threads.
pub trait Transform: Send + Sync {
    fn apply(&self, input: &Array1<f64>) -> Array1<f64>;
}

/// Converts windows to feature vectors and back.
///
/// `forward` and `inverse` are not required to be inverses of each other;
/// the spectral vectorizer deliberately loses phase information.
pub trait Vectorizer {
    fn forward(&self, window: &[f64]) -> Array1<f64>;
    fn inverse(&self, vector: &Array1<f64>) -> Vec<f64>;
}

/// Applies a fitted model to a sample stream, window by window.
///
/// Each full window is vectorized with the same vectorizer variant used
/// during fitting, run through the model, mapped back to the sample
/// domain, and clipped to [-1, 1]. The trailing partial window is
/// dropped, mirroring segmentation during training.
pub struct Converter<'a, V: Vectorizer, T: Transform + ?Sized> {
    vectorizer: &'a V,
    transform: &'a T,
    window_size: usize,
}

impl<'a, V: Vectorizer, T: Transform + ?Sized> Converter<'a, V, T> {
    pub fn new(vectorizer: &'a V, transform: &'a T, window_size: usize) -> Self {
        Self {
            vectorizer,
            transform,
            window_size,
        }
    }

    pub fn convert(&self, samples: &[f64]) -> Vec<f64> {
        let full = samples.len() - samples.len() % self.window_size;
        let mut out = Vec::with_capacity(full);
        for window in windows(samples, self.window_size) {
            let features = self.vectorizer.forward(window);
            let mapped = self.transform.apply(&features);
            for sample in self.vectorizer.inverse(&mapped) {
                out.push(clip(sample));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identity stand-ins so the runner can be exercised without a
    /// numeric backend.
    struct PassthroughVectorizer;

    impl Vectorizer for PassthroughVectorizer {
        fn forward(&self, window: &[f64]) -> Array1<f64> {
            Array1::from_iter(window.iter().copied())
        }

        fn inverse(&self, vector: &Array1<f64>) -> Vec<f64> {
            vector.to_vec()
        }
    }

    struct Gain(f64);

    impl Transform for Gain {
        fn apply(&self, input: &Array1<f64>) -> Array1<f64> {
            input * self.0
        }
    }

    #[test]
    fn converts_window_by_window_and_drops_remainder() {
        let samples = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let converter = Converter::new(&PassthroughVectorizer, &Gain(2.0), 2);
        let out = converter.convert(&samples);
        assert_eq!(out, vec![0.2, 0.4, 0.6, 0.8]);
    }

    #[test]
    fn output_is_clipped_regardless_of_model_magnitude() {
        let samples = vec![0.9, -0.9, 0.1, 0.2];
        let converter = Converter::new(&PassthroughVectorizer, &Gain(100.0), 2);
        let out = converter.convert(&samples);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(out, vec![1.0, -1.0, 1.0, 1.0]);
    }
}
