//! Stage 6: dependency-aware ordering (spec §4.3 stage 6).
//!
//! Tarjan-SCC over the chunk-level dependency graph, then a topological
//! sort of SCCs so definitions precede usages; within an SCC, sort by
//! dependency level (BFS depth from leaves). Ties within the reranker's
//! scoring are reordered; the relative order of chunks in different SCCs
//! that have no dependency relation is left as the scoring produced it.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::chunk::ScoredChunk;

struct Tarjan<'a> {
    edges: &'a HashMap<String, Vec<String>>,
    index_counter: usize,
    stack: Vec<String>,
    on_stack: HashSet<String>,
    indices: HashMap<String, usize>,
    lowlink: HashMap<String, usize>,
    sccs: Vec<Vec<String>>,
}

impl<'a> Tarjan<'a> {
    fn new(edges: &'a HashMap<String, Vec<String>>) -> Self {
        Self {
            edges,
            index_counter: 0,
            stack: Vec::new(),
            on_stack: HashSet::new(),
            indices: HashMap::new(),
            lowlink: HashMap::new(),
            sccs: Vec::new(),
        }
    }

    fn run(mut self, nodes: &[String]) -> Vec<Vec<String>> {
        for node in nodes {
            if !self.indices.contains_key(node) {
                self.strongconnect(node.clone());
            }
        }
        self.sccs
    }

    fn strongconnect(&mut self, v: String) {
        self.indices.insert(v.clone(), self.index_counter);
        self.lowlink.insert(v.clone(), self.index_counter);
        self.index_counter += 1;
        self.stack.push(v.clone());
        self.on_stack.insert(v.clone());

        if let Some(targets) = self.edges.get(&v) {
            for w in targets.clone() {
                if !self.indices.contains_key(&w) {
                    self.strongconnect(w.clone());
                    let w_low = self.lowlink[&w];
                    let v_low = self.lowlink[&v];
                    self.lowlink.insert(v.clone(), v_low.min(w_low));
                } else if self.on_stack.contains(&w) {
                    let w_idx = self.indices[&w];
                    let v_low = self.lowlink[&v];
                    self.lowlink.insert(v.clone(), v_low.min(w_idx));
                }
            }
        }

        if self.lowlink[&v] == self.indices[&v] {
            let mut scc = Vec::new();
            loop {
                let Some(w) = self.stack.pop() else { break };
                self.on_stack.remove(&w);
                let is_v = w == v;
                scc.push(w);
                if is_v {
                    break;
                }
            }
            self.sccs.push(scc);
        }
    }
}

/// BFS depth from leaves (chunks with no outgoing edges) within one SCC,
/// used only to order members of the same SCC relative to each other.
fn depth_from_leaves(scc: &[String], edges: &HashMap<String, Vec<String>>) -> BTreeMap<String, usize> {
    let members: HashSet<&String> = scc.iter().collect();
    let mut depth: BTreeMap<String, usize> = BTreeMap::new();
    for node in scc {
        let out_degree_within_scc = edges
            .get(node)
            .map(|targets| targets.iter().filter(|t| members.contains(t)).count())
            .unwrap_or(0);
        if out_degree_within_scc == 0 {
            depth.insert(node.clone(), 0);
        }
    }
    let mut changed = true;
    while changed {
        changed = false;
        for node in scc {
            if depth.contains_key(node) {
                continue;
            }
            if let Some(targets) = edges.get(node) {
                let within: Vec<&String> = targets.iter().filter(|t| members.contains(t)).collect();
                if within.iter().all(|t| depth.contains_key(t.as_str())) {
                    let max_child = within.iter().map(|t| depth[t.as_str()]).max().unwrap_or(0);
                    depth.insert(node.clone(), max_child + 1);
                    changed = true;
                }
            }
        }
    }
    for node in scc {
        depth.entry(node.clone()).or_insert(0);
    }
    depth
}

/// Reorder `chunks` so definitions precede usages, preserving the
/// reranker's scoring as the tie-break within topologically-equal groups.
#[must_use]
pub fn dependency_order(chunks: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    let ids: Vec<String> = chunks.iter().map(|c| c.chunk.id.clone()).collect();
    let by_id: HashMap<String, ScoredChunk> = chunks.into_iter().map(|c| (c.chunk.id.clone(), c)).collect();

    let mut edges: HashMap<String, Vec<String>> = HashMap::new();
    for id in &ids {
        if let Some(chunk) = by_id.get(id) {
            let targets: Vec<String> = chunk
                .chunk
                .edges
                .iter()
                .map(|e| e.target.clone())
                .filter(|t| by_id.contains_key(t))
                .collect();
            edges.insert(id.clone(), targets);
        }
    }

    let sccs = Tarjan::new(&edges).run(&ids);

    // Tarjan emits SCCs in reverse topological order (sinks first); a
    // chunk's dependencies (its usages call into) are emitted before it.
    // We want definitions (dependencies) before usages, so reverse once.
    let mut ordered: Vec<ScoredChunk> = Vec::with_capacity(ids.len());
    for scc in sccs.into_iter().rev() {
        let depths = depth_from_leaves(&scc, &edges);
        let mut members: Vec<String> = scc;
        members.sort_by(|a, b| {
            let da = depths.get(a).copied().unwrap_or(0);
            let db = depths.get(b).copied().unwrap_or(0);
            db.cmp(&da).then_with(|| {
                let sa = by_id.get(a).map_or(0.0, |c| c.score);
                let sb = by_id.get(b).map_or(0.0, |c| c.score);
                sb.total_cmp(&sa)
            })
        });
        for id in members {
            if let Some(chunk) = by_id.get(&id) {
                ordered.push(chunk.clone());
            }
        }
    }
    ordered
}
