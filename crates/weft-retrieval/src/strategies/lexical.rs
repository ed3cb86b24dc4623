//! Lexical strategy: term-overlap scoring over chunk content.

use std::collections::BTreeSet;

use super::{RetrievalStrategy, StrategyHit};
use crate::chunk::RetrievalChunk;

pub struct LexicalStrategy;

fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl RetrievalStrategy for LexicalStrategy {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn retrieve(&self, query: &str, corpus: &[RetrievalChunk], top_k: usize) -> Vec<StrategyHit> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(String, f64)> = corpus
            .iter()
            .map(|chunk| {
                let chunk_terms = tokenize(&chunk.content);
                let overlap = query_terms.intersection(&chunk_terms).count();
                (chunk.id.clone(), overlap as f64 / query_terms.len() as f64)
            })
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
    fn ranks_higher_overlap_first() {
        let corpus = vec![
            RetrievalChunk::new("a", "a.rs", "fn authenticate_user() {}"),
            RetrievalChunk::new("b", "b.rs", "fn unrelated() {}"),
        ];
        let hits = LexicalStrategy.retrieve("authenticate user", &corpus, 10);
        assert_eq!(hits[0].chunk_id, "a");
    }
}
