//! Stage 7: cross-encoder final rerank (spec §4.3 stage 7).
//!
//! Restricted to the top `≤20` candidates; returns the final top-K (default
//! 10). Each per-pair score is cached, keyed by the SHA-256 of
//! `(lowercased query, chunk_id, content_hash, prompt_version)`, with an
//! explicit LRU eviction policy — same cache shape as
//! `embedding_cache::InMemoryEmbeddingCache`, specialized to a scalar score.

use std::collections::{HashMap, VecDeque};

use sha2::{Digest, Sha256};

use crate::chunk::ScoredChunk;

pub const PROMPT_VERSION: &str = "v1";

fn cache_key(query: &str, chunk_id: &str, content_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.to_lowercase().as_bytes());
    hasher.update(b"\0");
    hasher.update(chunk_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(content_hash.as_bytes());
    hasher.update(b"\0");
    hasher.update(PROMPT_VERSION.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Thread-safe-by-construction: callers hold this behind their own `Mutex`
/// if shared across threads, matching the lock shapes used elsewhere in
/// this workspace (the cache itself has no interior locking).
pub struct CrossEncoderCache {
    capacity: usize,
    order: VecDeque<String>,
    scores: HashMap<String, f64>,
}

impl CrossEncoderCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            scores: HashMap::new(),
        }
    }

    fn insert(&mut self, key: String, score: f64) {
        if !self.scores.contains_key(&key) && self.scores.len() >= self.capacity
            && let Some(evicted) = self.order.pop_front()
        {
            self.scores.remove(&evicted);
        }
        self.scores.insert(key.clone(), score);
        self.order.push_back(key);
    }
}

pub trait PairScorer {
    fn score(&self, query: &str, chunk: &ScoredChunk) -> f64;
}

/// Restrict to the top `max_candidates`, score each pair (cached), return
/// the final top `final_k`.
pub fn rerank(
    scorer: &dyn PairScorer,
    cache: &mut CrossEncoderCache,
    query: &str,
    chunks: Vec<ScoredChunk>,
    max_candidates: usize,
    final_k: usize,
) -> Vec<ScoredChunk> {
    let mut candidates: Vec<ScoredChunk> = chunks.into_iter().take(max_candidates).collect();

    for chunk in &mut candidates {
        let hash = content_hash(&chunk.chunk.content);
        let key = cache_key(query, &chunk.chunk.id, &hash);
        let score = cache.scores.get(&key).copied().unwrap_or_else(|| {
            let computed = scorer.score(query, chunk);
            cache.insert(key, computed);
            computed
        });
        chunk.score = score;
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.chunk.id.cmp(&b.chunk.id)));
    candidates.into_iter().take(final_k).collect()
}
