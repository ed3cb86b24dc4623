//! Symbol strategy: exact and substring matches against declared symbols.

use super::{RetrievalStrategy, StrategyHit};
use crate::chunk::RetrievalChunk;

pub struct SymbolStrategy;

impl RetrievalStrategy for SymbolStrategy {
    fn name(&self) -> &'static str {
        "symbol"
    }

    fn retrieve(&self, query: &str, corpus: &[RetrievalChunk], top_k: usize) -> Vec<StrategyHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(String, f64)> = corpus
            .iter()
            .filter_map(|chunk| {
                let best = chunk
                    .symbols
                    .iter()
                    .map(|symbol| {
                        let symbol_lc = symbol.to_lowercase();
                        if symbol_lc == needle {
                            2.0
                        } else if symbol_lc.contains(&needle) {
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .fold(0.0_f64, f64::max);
                (best > 0.0).then(|| (chunk.id.clone(), best))
            })
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
    fn exact_symbol_match_outranks_substring() {
        let corpus = vec![
            RetrievalChunk::new("a", "a.rs", "").with_symbol("AuthService"),
            RetrievalChunk::new("b", "b.rs", "").with_symbol("AuthServiceFactory"),
        ];
        let hits = SymbolStrategy.retrieve("AuthService", &corpus, 10);
        assert_eq!(hits[0].chunk_id, "a");
    }
}
