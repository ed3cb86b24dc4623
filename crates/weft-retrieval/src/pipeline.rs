//! The seven-stage hybrid retrieval pipeline (spec §4.3), wired end to end.

use std::time::{Duration, Instant};

use crate::chunk::RetrievalChunk;
use crate::config::RetrievalConfig;
use crate::cross_encoder::{self, CrossEncoderCache, PairScorer};
use crate::error::RetrievalError;
use crate::expansion::{self, Vocabulary};
use crate::fusion;
use crate::ordering;
use crate::reranker::{self, LightweightReranker, Reranker};
use crate::strategies::{self, RetrievalStrategy};
use crate::topk::{self, QueryIntent};

/// Per-stage latency, in the same order the stages run (spec §4.3
/// "per-stage latency accounting").
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageLatencies {
    pub top_k_selection: Duration,
    pub query_expansion: Duration,
    pub multi_strategy_retrieval: Duration,
    pub fusion: Duration,
    pub reranking: Duration,
    pub dependency_ordering: Duration,
    pub cross_encoder: Duration,
}

pub struct RetrievalPipeline {
    pub config: RetrievalConfig,
    pub strategies: Vec<Box<dyn RetrievalStrategy + Send + Sync>>,
    pub reranker: Box<dyn Reranker + Send + Sync>,
    pub cross_encoder_scorer: Box<dyn PairScorer + Send + Sync>,
}

impl RetrievalPipeline {
    #[must_use]
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            config,
            strategies: vec![
                Box::new(strategies::VectorStrategy),
                Box::new(strategies::LexicalStrategy),
                Box::new(strategies::SymbolStrategy),
                Box::new(strategies::GraphStrategy),
            ],
            reranker: Box::new(LightweightReranker),
            cross_encoder_scorer: Box::new(RerankerAsPairScorer),
        }
    }

    /// Run all seven stages against `corpus`, returning the final ranked
    /// chunks and per-stage latency.
    ///
    /// # Errors
    /// Returns `RetrievalError::EmptyQuery` for a blank query, or
    /// `RetrievalError::AllStrategiesFailed` if every strategy yields no
    /// hits at all.
    pub fn run(
        &self,
        query: &str,
        intent: QueryIntent,
        corpus: &[RetrievalChunk],
        vocab: &Vocabulary,
        cache: &mut CrossEncoderCache,
    ) -> Result<(Vec<crate::chunk::ScoredChunk>, StageLatencies), RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        let mut latencies = StageLatencies::default();

        let t = Instant::now();
        let top_k = topk::select_top_k(query, intent, &self.config.adaptive_top_k);
        latencies.top_k_selection = t.elapsed();

        let t = Instant::now();
        let expanded = expansion::expand_query(query, vocab, 5);
        latencies.query_expansion = t.elapsed();

        let t = Instant::now();
        let strategy_results = strategies::run_all(&self.strategies, &expanded, corpus, top_k as usize);
        latencies.multi_strategy_retrieval = t.elapsed();

        if strategy_results.iter().all(|(_, hits)| hits.is_empty()) {
            return Err(RetrievalError::AllStrategiesFailed { query: query.to_owned() });
        }

        let t = Instant::now();
        let fused = fusion::fuse(
            &strategy_results,
            corpus,
            intent,
            self.config.rrf_k,
            self.config.consensus_boost_base,
            self.config.consensus_max_strategies,
        );
        latencies.fusion = t.elapsed();

        let t = Instant::now();
        let reranked = reranker::rerank(self.reranker.as_ref(), &expanded, fused);
        latencies.reranking = t.elapsed();

        let t = Instant::now();
        let ordered = ordering::dependency_order(reranked);
        latencies.dependency_ordering = t.elapsed();

        let t = Instant::now();
        let finalists = cross_encoder::rerank(
            self.cross_encoder_scorer.as_ref(),
            cache,
            &expanded,
            ordered,
            self.config.cross_encoder_candidates,
            self.config.final_top_k,
        );
        latencies.cross_encoder = t.elapsed();

        Ok((finalists, latencies))
    }
}

/// Bridges the stage-5 `Reranker` into stage-7's `PairScorer` seam so the
/// pipeline ships with one scoring model end to end by default; a real
/// deployment would supply a distinct cross-encoder here.
struct RerankerAsPairScorer;

impl PairScorer for RerankerAsPairScorer {
    fn score(&self, query: &str, chunk: &crate::chunk::ScoredChunk) -> f64 {
        LightweightReranker.rescore(query, chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::EdgeKind;

    #[test]
    fn pipeline_runs_all_stages_and_returns_ranked_chunks() {
        let corpus = vec![
            RetrievalChunk::new("auth", "auth.rs", "fn authenticate_user(token: &str) {}").with_symbol("authenticate_user"),
            RetrievalChunk::new("caller", "main.rs", "authenticate_user(token)").with_edge("auth", EdgeKind::Calls),
            RetrievalChunk::new("unrelated", "misc.rs", "fn do_something_else() {}"),
        ];
        let pipeline = RetrievalPipeline::new(RetrievalConfig::default());
        let vocab = Vocabulary::new();
        let mut cache = CrossEncoderCache::new(100);
        let (results, _latencies) = pipeline
            .run("authenticate user", QueryIntent::General, &corpus, &vocab, &mut cache)
            .unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().any(|r| r.chunk.id == "auth"));
    }

    #[test]
    fn empty_query_is_rejected() {
        let pipeline = RetrievalPipeline::new(RetrievalConfig::default());
        let vocab = Vocabulary::new();
        let mut cache = CrossEncoderCache::new(10);
        let result = pipeline.run("   ", QueryIntent::General, &[], &vocab, &mut cache);
        assert!(matches!(result, Err(RetrievalError::EmptyQuery)));
    }

    #[test]
    fn no_matching_chunks_reports_all_strategies_failed() {
        let corpus = vec![RetrievalChunk::new("x", "x.rs", "completely different topic")];
        let pipeline = RetrievalPipeline::new(RetrievalConfig::default());
        let vocab = Vocabulary::new();
        let mut cache = CrossEncoderCache::new(10);
        let result = pipeline.run("zzz_no_match_zzz", QueryIntent::General, &corpus, &vocab, &mut cache);
        assert!(matches!(result, Err(RetrievalError::AllStrategiesFailed { .. })));
    }
}
