//! Stage 4: smart interleaving via weighted Reciprocal Rank Fusion (spec
//! §4.3 stage 4).
//!
//! `score(c) = Σ w_s · 1/(rrf_k + rank_s(c)) · (1 + boost(|{s: c ∈ s}|))`
//! where the consensus boost saturates once a chunk appears in
//! `consensus_max_strategies` distinct strategies' results.

use std::collections::BTreeMap;

use crate::chunk::{RetrievalChunk, ScoredChunk};
use crate::strategies::StrategyHit;
use crate::topk::QueryIntent;

/// Per-strategy weight for a given intent (spec §4.3 stage 4: "symbol-heavy
/// for definitional intents, graph-heavy for flow tracing").
#[must_use]
pub fn strategy_weight(strategy: &str, intent: QueryIntent) -> f64 {
    match (strategy, intent) {
        ("symbol", QueryIntent::SymbolNavigation) => 2.0,
        ("graph", QueryIntent::FlowTracing) => 2.0,
        ("vector", QueryIntent::ConceptSearch) => 1.5,
        _ => 1.0,
    }
}

/// Fuse per-strategy rankings into one score per chunk.
#[must_use]
pub fn fuse(
    strategy_results: &[(&'static str, Vec<StrategyHit>)],
    corpus: &[RetrievalChunk],
    intent: QueryIntent,
    rrf_k: u32,
    consensus_boost_base: f64,
    consensus_max_strategies: u32,
) -> Vec<ScoredChunk> {
    let by_id: BTreeMap<&str, &RetrievalChunk> = corpus.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut scores: BTreeMap<String, f64> = BTreeMap::new();
    let mut hit_counts: BTreeMap<String, u32> = BTreeMap::new();

    for (strategy, hits) in strategy_results {
        let weight = strategy_weight(strategy, intent);
        for hit in hits {
            let contribution = weight / (f64::from(rrf_k) + hit.rank as f64 + 1.0);
            *scores.entry(hit.chunk_id.clone()).or_insert(0.0) += contribution;
            *hit_counts.entry(hit.chunk_id.clone()).or_insert(0) += 1;
        }
    }

    let mut out: Vec<ScoredChunk> = scores
        .into_iter()
        .filter_map(|(chunk_id, base_score)| {
            let hits = hit_counts.get(&chunk_id).copied().unwrap_or(1);
            let saturated = hits.min(consensus_max_strategies);
            let boost = 1.0 + consensus_boost_base * f64::from(saturated.saturating_sub(1));
            by_id.get(chunk_id.as_str()).map(|chunk| ScoredChunk {
                chunk: (*chunk).clone(),
                score: base_score * boost,
                strategy_hits: hits,
            })
        })
        .collect();

    out.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.chunk.id.cmp(&b.chunk.id)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str) -> RetrievalChunk {
        RetrievalChunk::new(id, format!("{id}.rs"), "")
    }

    #[test]
    fn chunk_hit_by_multiple_strategies_outranks_single_hit() {
        let corpus = vec![chunk("a"), chunk("b")];
        let results = vec![
            ("lexical", vec![StrategyHit { chunk_id: "a".into(), rank: 0 }, StrategyHit { chunk_id: "b".into(), rank: 1 }]),
            ("vector", vec![StrategyHit { chunk_id: "a".into(), rank: 0 }]),
        ];
        let fused = fuse(&results, &corpus, QueryIntent::General, 60, 0.35, 3);
        assert_eq!(fused[0].chunk.id, "a");
        assert_eq!(fused[0].strategy_hits, 2);
    }

    #[test]
    fn consensus_boost_saturates_at_max_strategies() {
        let corpus = vec![chunk("a")];
        let results = vec![
            ("lexical", vec![StrategyHit { chunk_id: "a".into(), rank: 0 }]),
            ("vector", vec![StrategyHit { chunk_id: "a".into(), rank: 0 }]),
            ("symbol", vec![StrategyHit { chunk_id: "a".into(), rank: 0 }]),
            ("graph", vec![StrategyHit { chunk_id: "a".into(), rank: 0 }]),
        ];
        let fused_capped = fuse(&results, &corpus, QueryIntent::General, 60, 0.35, 3);
        let fused_uncapped = fuse(&results, &corpus, QueryIntent::General, 60, 0.35, 4);
        assert!(fused_uncapped[0].score > fused_capped[0].score);
    }
}
