use morph_core::{windows, ConversionConfig, MorphError, Result, Vectorizer};
use ndarray::Array1;

/// One vectorized (source, target) window pair.
#[derive(Debug, Clone)]
pub struct TrainingPair {
    pub source: Array1<f64>,
    pub target: Array1<f64>,
}

/// Segments two equal-length recordings into corresponding windows,
/// vectorizes both sides, and drops near-silent pairs.
///
/// The energy gate compares each feature vector's self dot-product
/// against `min_amplitude` with a strict `<`: a pair at exactly the
/// threshold is kept, and a pair failing on either side is dropped
/// entirely. This filtering is deliberate, not an error.
pub fn build_pairs<V: Vectorizer>(
    source: &[f64],
    target: &[f64],
    vectorizer: &V,
    config: &ConversionConfig,
) -> Result<Vec<TrainingPair>> {
    if source.len() != target.len() {
        return Err(MorphError::InsufficientData(format!(
            "source and target recordings must have matching sample counts (have {} and {})",
            source.len(),
            target.len()
        )));
    }

    let w = config.window_size;
    let mut pairs = Vec::new();
    for (src_window, tgt_window) in windows(source, w).zip(windows(target, w)) {
        let src_vec = vectorizer.forward(src_window);
        let tgt_vec = vectorizer.forward(tgt_window);
        if src_vec.dot(&src_vec) < config.min_amplitude
            || tgt_vec.dot(&tgt_vec) < config.min_amplitude
        {
            continue;
        }
        pairs.push(TrainingPair {
            source: src_vec,
            target: tgt_vec,
        });
    }
    Ok(pairs)
}
