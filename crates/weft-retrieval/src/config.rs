//! Retrieval pipeline tuning (spec §6 "Config options"), grounded on
//! `omni-core`'s `Config`/`IndexingConfig` nesting and `topk_selector.py`'s
//! `TopKConfig`.

use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetrievalConfig {
    pub adaptive_top_k: AdaptiveTopK,
    /// Reciprocal rank fusion constant (spec default 60).
    pub rrf_k: u32,
    /// Base multiplier for the consensus boost applied to a chunk that
    /// appears in multiple strategies' results.
    pub consensus_boost_base: f64,
    /// Strategy count at which the consensus boost saturates.
    pub consensus_max_strategies: u32,
    /// Final top-K returned by the cross-encoder stage (spec default 10).
    pub final_top_k: usize,
    /// Max candidates entering the cross-encoder stage (spec "restricted to
    /// the top ≤20").
    pub cross_encoder_candidates: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            adaptive_top_k: AdaptiveTopK::default(),
            rrf_k: 60,
            consensus_boost_base: 0.35,
            consensus_max_strategies: 3,
            final_top_k: 10,
            cross_encoder_candidates: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AdaptiveTopK {
    pub min: u32,
    pub default: u32,
    pub max: u32,
    pub simple_k: u32,
    pub medium_k: u32,
    pub complex_k: u32,
}

impl Default for AdaptiveTopK {
    fn default() -> Self {
        Self {
            min: 5,
            default: 50,
            max: 100,
            simple_k: 10,
            medium_k: 30,
            complex_k: 80,
        }
    }
}
