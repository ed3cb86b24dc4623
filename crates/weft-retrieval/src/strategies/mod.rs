//! Stage 3: multi-strategy retrieval (spec §4.3 stage 3).
//!
//! Each strategy is a trait object so the pipeline can run a fixed set
//! without matching on strategy identity — grounded on `codegraph-ir`'s
//! `IndexPlugin` seam for modeling an external-capability strategy as a
//! trait rather than a closed enum. A strategy that fails is logged and
//! treated as an empty result set; the pipeline never aborts on one
//! strategy's failure.

pub mod graph;
pub mod lexical;
pub mod symbol;
pub mod vector;

use crate::chunk::RetrievalChunk;

/// One ranked result from a single strategy: a chunk id and its rank
/// (0-based, best first) within that strategy's own results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyHit {
    pub chunk_id: String,
    pub rank: usize,
}

pub trait RetrievalStrategy {
    fn name(&self) -> &'static str;

    /// Rank `corpus` against `query`, returning at most `top_k` hits, best
    /// first. Implementations should never panic; a strategy with nothing
    /// relevant returns an empty `Vec`.
    fn retrieve(&self, query: &str, corpus: &[RetrievalChunk], top_k: usize) -> Vec<StrategyHit>;
}

pub use graph::GraphStrategy;
pub use lexical::LexicalStrategy;
pub use symbol::SymbolStrategy;
pub use vector::VectorStrategy;

/// Run every strategy, catching panics so one strategy's failure degrades
/// to an empty result rather than aborting the pipeline (spec §4.3 stage 3).
#[must_use]
pub fn run_all(
    strategies: &[Box<dyn RetrievalStrategy + Send + Sync>],
    query: &str,
    corpus: &[RetrievalChunk],
    top_k: usize,
) -> Vec<(&'static str, Vec<StrategyHit>)> {
    strategies
        .iter()
        .map(|strategy| {
            let name = strategy.name();
            let hits = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| strategy.retrieve(query, corpus, top_k)))
                .unwrap_or_else(|_| {
                    tracing::warn!(strategy = name, "retrieval strategy panicked, yielding empty result");
                    Vec::new()
                });
            (name, hits)
        })
        .collect()
}
