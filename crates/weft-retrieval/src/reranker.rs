//! Stage 5: learned lightweight reranker (spec §4.3 stage 5).
//!
//! A pure function of `(query, chunk)` — the spec requires no internal
//! state, so a real model swap is a drop-in replacement of `rescore`.

use crate::chunk::ScoredChunk;

pub trait Reranker {
    fn rescore(&self, query: &str, chunk: &ScoredChunk) -> f64;
}

/// Lightweight length-normalized term-overlap reranker, standing in for a
/// small local cross-encoder-lite model.
pub struct LightweightReranker;

impl Reranker for LightweightReranker {
    fn rescore(&self, query: &str, chunk: &ScoredChunk) -> f64 {
        let query_terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if query_terms.is_empty() {
            return chunk.score;
        }
        let content_lc = chunk.chunk.content.to_lowercase();
        let hits = query_terms.iter().filter(|t| content_lc.contains(t.as_str())).count();
        let overlap_ratio = hits as f64 / query_terms.len() as f64;
        chunk.score * (1.0 + overlap_ratio)
    }
}

/// Apply `reranker` to every chunk, re-sort by the new score.
pub fn rerank(reranker: &dyn Reranker, query: &str, chunks: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    let mut rescored: Vec<ScoredChunk> = chunks
        .into_iter()
        .map(|mut c| {
            c.score = reranker.rescore(query, &c);
            c
        })
        .collect();
    rescored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.chunk.id.cmp(&b.chunk.id)));
    rescored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::RetrievalChunk;

    #[test]
    fn query_term_overlap_boosts_score() {
        let chunk = ScoredChunk {
            chunk: RetrievalChunk::new("a", "a.rs", "fn authenticate_session()"),
            score: 1.0,
            strategy_hits: 1,
        };
        let reranked = rerank(&LightweightReranker, "authenticate session", vec![chunk]);
        assert!(reranked[0].score > 1.0);
    }
}
