// Accuracy scoring: how much of the reference shape a trace covers.
//
// A reference pixel counts as covered when at least one submitted pixel lies
// within the proximity tolerance of it (Euclidean, inclusive). Accuracy is the
// covered fraction of reference pixels, in `[0, 1]`. The tolerance exists
// because scaled mouse positions almost never land exactly on a reference
// pixel.
//
// Pure and deterministic: same inputs, same score. Empty reference or empty
// submission scores 0.

use crate::types::Pixel;

/// Default coverage radius in canvas pixels.
pub const PROXIMITY_TOLERANCE: f64 = 8.0;

/// Score `submitted` against `reference` with the default tolerance.
pub fn accuracy(submitted: &[Pixel], reference: &[Pixel]) -> f64 {
    accuracy_within(submitted, reference, PROXIMITY_TOLERANCE)
}

/// Score `submitted` against `reference`, counting a reference pixel as
/// covered if a submitted pixel is at most `tolerance` away.
pub fn accuracy_within(submitted: &[Pixel], reference: &[Pixel], tolerance: f64) -> f64 {
    if reference.is_empty() || submitted.is_empty() {
        return 0.0;
    }
    let limit = tolerance * tolerance;
    let covered = reference
        .iter()
        .filter(|r| submitted.iter().any(|s| s.distance_squared(**r) <= limit))
        .count();
    covered as f64 / reference.len() as f64
}
