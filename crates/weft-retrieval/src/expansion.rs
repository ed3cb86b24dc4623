//! Stage 2: contextual query expansion (spec §4.3 stage 2).
//!
//! Grounded on `contextual_expansion.py`: a codebase vocabulary of known
//! identifiers supplies candidate expansions, boosted by a co-occurrence
//! counter; the top expansions are appended to the query, de-duplicated
//! against the original terms.

use std::collections::{BTreeMap, BTreeSet};

/// Vocabulary learned from indexed chunks: identifiers and how often they
/// co-occur with each other (symmetric counts, keyed by the unordered pair
/// via a sorted tuple).
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    co_occurrence: BTreeMap<(String, String), u32>,
    terms: BTreeSet<String>,
}

impl Vocabulary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `terms` all appeared together in one chunk.
    pub fn observe(&mut self, terms: &[&str]) {
        for &t in terms {
            self.terms.insert(t.to_owned());
        }
        for i in 0..terms.len() {
            for j in (i + 1)..terms.len() {
                let key = if terms[i] <= terms[j] {
                    (terms[i].to_owned(), terms[j].to_owned())
                } else {
                    (terms[j].to_owned(), terms[i].to_owned())
                };
                *self.co_occurrence.entry(key).or_insert(0) += 1;
            }
        }
    }

    /// Terms most frequently co-occurring with `term`, most frequent first.
    fn companions_of(&self, term: &str) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> = self
            .co_occurrence
            .iter()
            .filter_map(|((a, b), count)| {
                if a == term {
                    Some((b.clone(), *count))
                } else if b == term {
                    Some((a.clone(), *count))
                } else {
                    None
                }
            })
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}

/// Expand `query` with up to `max_expansions` companion terms, skipping
/// anything already present in the query.
#[must_use]
pub fn expand_query(query: &str, vocab: &Vocabulary, max_expansions: usize) -> String {
    let original: BTreeSet<String> = query.split_whitespace().map(str::to_lowercase).collect();
    let mut candidates: BTreeMap<String, u32> = BTreeMap::new();
    for term in &original {
        for (companion, count) in vocab.companions_of(term) {
            if original.contains(&companion) {
                continue;
            }
            let entry = candidates.entry(companion).or_insert(0);
            *entry += count;
        }
    }
    let mut ranked: Vec<(String, u32)> = candidates.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let expansions: Vec<String> = ranked.into_iter().take(max_expansions).map(|(term, _)| term).collect();
    if expansions.is_empty() {
        query.to_owned()
    } else {
        format!("{query} {}", expansions.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_with_frequent_companion() {
        let mut vocab = Vocabulary::new();
        vocab.observe(&["login", "authenticate", "session"]);
        vocab.observe(&["login", "authenticate", "token"]);
        let expanded = expand_query("login", &vocab, 2);
        assert!(expanded.contains("authenticate"));
        assert!(!expanded.eq("login"));
    }

    #[test]
    fn no_vocabulary_leaves_query_unchanged() {
        let vocab = Vocabulary::new();
        assert_eq!(expand_query("login", &vocab, 5), "login");
    }

    #[test]
    fn never_duplicates_an_original_term() {
        let mut vocab = Vocabulary::new();
        vocab.observe(&["login", "session"]);
        let expanded = expand_query("login session", &vocab, 5);
        let words: Vec<&str> = expanded.split_whitespace().collect();
        let unique: BTreeSet<&str> = words.iter().copied().collect();
        assert_eq!(words.len(), unique.len());
    }
}
