//! Graph strategy: BFS outward from symbol-matched seed chunks along
//! dependency edges (spec §4.3 stage 3; edges per stage 6's edge kinds).

use std::collections::{BTreeMap, HashSet, VecDeque};

use super::{RetrievalStrategy, StrategyHit};
use crate::chunk::RetrievalChunk;

pub struct GraphStrategy;

impl RetrievalStrategy for GraphStrategy {
    fn name(&self) -> &'static str {
        "graph"
    }

    fn retrieve(&self, query: &str, corpus: &[RetrievalChunk], top_k: usize) -> Vec<StrategyHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let by_id: BTreeMap<&str, &RetrievalChunk> = corpus.iter().map(|c| (c.id.as_str(), c)).collect();

        let seeds: Vec<&str> = corpus
            .iter()
            .filter(|chunk| chunk.symbols.iter().any(|s| s.to_lowercase().contains(&needle)))
            .map(|chunk| chunk.id.as_str())
            .collect();
        if seeds.is_empty() {
            return Vec::new();
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut order: Vec<&str> = Vec::new();
        let mut queue: VecDeque<&str> = seeds.into_iter().collect();
        for &seed in &queue {
            visited.insert(seed);
        }
        while let Some(id) = queue.pop_front() {
            order.push(id);
            if let Some(chunk) = by_id.get(id) {
                for edge in &chunk.edges {
                    if visited.insert(edge.target.as_str()) {
                        queue.push_back(edge.target.as_str());
                    }
                }
            }
        }

        order
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(rank, chunk_id)| StrategyHit {
                chunk_id: chunk_id.to_owned(),
                rank,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::EdgeKind;

    #[test]
    fn traverses_outgoing_edges_from_seed() {
        let corpus = vec![
            RetrievalChunk::new("a", "a.rs", "").with_symbol("Handler").with_edge("b", EdgeKind::Calls),
            RetrievalChunk::new("b", "b.rs", ""),
        ];
        let hits = GraphStrategy.retrieve("Handler", &corpus, 10);
        assert_eq!(hits.iter().map(|h| h.chunk_id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
