//! MaxSim late interaction (spec §4.3 "MaxSim").
//!
//! For each query token embedding, take the maximum cosine similarity with
//! any document token embedding, then sum the maxima. A CPU path is always
//! available; a batched GPU path is a deployment-specific extension not
//! modeled here.

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// `Σ_q max_d cos(q, d)` over query token embeddings `query_tokens` and
/// document token embeddings `doc_tokens`.
#[must_use]
pub fn maxsim(query_tokens: &[Vec<f32>], doc_tokens: &[Vec<f32>]) -> f32 {
    if doc_tokens.is_empty() {
        return 0.0;
    }
    query_tokens
        .iter()
        .map(|q| doc_tokens.iter().map(|d| cosine(q, d)).fold(f32::MIN, f32::max))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_tokens_maximize_score() {
        let q = vec![vec![1.0, 0.0]];
        let d = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert!((maxsim(&q, &d) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_document_yields_zero() {
        let q = vec![vec![1.0, 0.0]];
        assert_eq!(maxsim(&q, &[]), 0.0);
    }
}
