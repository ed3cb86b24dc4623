//! Oscillation detector (spec §4.4): over the last `2 * window_size`
//! patches, if the trailing window is too similar to the preceding window,
//! the loop is cycling rather than progressing.

use crate::model::patch::Patch;

use super::convergence::jaccard_similarity;

pub const DEFAULT_WINDOW_SIZE: usize = 3;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Average pairwise Jaccard similarity between two equal-length windows of
/// patches, compared positionally (trailing[i] vs preceding[i]).
fn window_similarity(preceding: &[Patch], trailing: &[Patch]) -> f64 {
    if preceding.is_empty() || preceding.len() != trailing.len() {
        return 0.0;
    }
    let total: f64 = preceding
        .iter()
        .zip(trailing.iter())
        .map(|(p, t)| jaccard_similarity(p, t))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    {
        total / preceding.len() as f64
    }
}

/// `true` if the patch history shows oscillation: not enough history
/// (fewer than `2 * window_size` patches) never triggers it.
#[must_use]
pub fn is_oscillating(history: &[Patch], window_size: usize, similarity_threshold: f64) -> bool {
    let needed = window_size * 2;
    if history.len() < needed {
        return false;
    }
    let tail = &history[history.len() - needed..];
    let (preceding, trailing) = tail.split_at(window_size);
    window_similarity(preceding, trailing) >= similarity_threshold
}
