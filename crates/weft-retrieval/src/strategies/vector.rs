//! Vector strategy: bag-of-words cosine similarity.
//!
//! A real deployment would call an embedding model (spec §4.3's "shared K"
//! strategy seam is exactly the trait boundary needed for that swap); this
//! term-frequency cosine is the CPU-only fallback the spec's MaxSim module
//! also falls back to when no embedding model is configured.

use std::collections::BTreeMap;

use super::{RetrievalStrategy, StrategyHit};
use crate::chunk::RetrievalChunk;

fn term_freq(text: &str) -> BTreeMap<String, f64> {
    let mut freq = BTreeMap::new();
    for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
        *freq.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }
    freq
}

fn cosine(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> f64 {
    let dot: f64 = a.iter().map(|(term, freq)| freq * b.get(term).copied().unwrap_or(0.0)).sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

pub struct VectorStrategy;

impl RetrievalStrategy for VectorStrategy {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn retrieve(&self, query: &str, corpus: &[RetrievalChunk], top_k: usize) -> Vec<StrategyHit> {
        let query_vec = term_freq(query);
        if query_vec.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(String, f64)> = corpus
            .iter()
            .map(|chunk| (chunk.id.clone(), cosine(&query_vec, &term_freq(&chunk.content))))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(rank, (chunk_id, _))| StrategyHit { chunk_id, rank })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closer_term_distribution_ranks_first() {
        let corpus = vec![
            RetrievalChunk::new("a", "a.rs", "session token validation validation"),
            RetrievalChunk::new("b", "b.rs", "unrelated content entirely"),
        ];
        let hits = VectorStrategy.retrieve("session token validation", &corpus, 10);
        assert_eq!(hits[0].chunk_id, "a");
    }
}
