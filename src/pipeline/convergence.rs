//! Convergence check (spec §4.4): "if the last two accepted patches' diff
//! ratio is below `1 - threshold`, mark Converged."

use crate::model::patch::Patch;

/// Default `convergence_threshold` (spec §6 Config options).
pub const DEFAULT_THRESHOLD: f64 = 0.95;

/// Jaccard similarity between two patches' changed-line sets, matched by
/// file path. Files present in only one patch contribute nothing to either
/// the intersection or the union (spec §4.4's oscillation-detector rule
/// "non-matching file sets yield zero" applies identically here, since
/// both measures are defined over the same matched-file union).
#[must_use]
pub fn jaccard_similarity(a: &Patch, b: &Patch) -> f64 {
    let lines_a = a.changed_lines_by_file();
    let lines_b = b.changed_lines_by_file();

    let mut intersection = 0usize;
    let mut union = 0usize;
    for (path, a_lines) in &lines_a {
        if let Some(b_lines) = lines_b.get(path) {
            intersection += a_lines.intersection(b_lines).count();
            union += a_lines.union(b_lines).count();
        }
    }
    if union == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        intersection as f64 / union as f64
    }
}

/// `diff_ratio = 1 - similarity`: how much the two patches differ.
#[must_use]
pub fn diff_ratio(a: &Patch, b: &Patch) -> f64 {
    1.0 - jaccard_similarity(a, b)
}

/// `true` once the last two accepted patches are similar enough that
/// further iteration would not meaningfully change the result.
#[must_use]
pub fn has_converged(previous_accepted: &Patch, latest_accepted: &Patch, threshold: f64) -> bool {
    diff_ratio(previous_accepted, latest_accepted) < 1.0 - threshold
}
