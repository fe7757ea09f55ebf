/// Splits a sample stream into fixed-size, non-overlapping windows at
/// offsets `0, w, 2w, ...`. Trailing samples that do not fill a full
/// window are silently dropped; there is no padding and no overlap.
///
/// The returned iterator borrows the input and may be recreated at any
/// time to restart the scan.
pub fn windows(samples: &[f64], window_size: usize) -> impl Iterator<Item = &[f64]> + '_ {
    assert!(window_size > 0, "window size must be positive");
    samples.chunks_exact(window_size)
}

/// Clamps one output sample into the valid range.
#[inline]
pub fn clip(sample: f64) -> f64 {
    sample.clamp(-1.0, 1.0)
}
