//! Stage 1: query analysis → adaptive top-K (spec §4.3 stage 1).
//!
//! Grounded on `topk_selector.py`'s `QueryComplexity`/`TopKConfig`: token
//! count, code-identifier detection, file-path detection, boolean operators
//! and a specificity score together pick a complexity level, which indexes
//! a configurable K table; intent may further clamp or expand K.

use crate::config::AdaptiveTopK;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComplexityLevel {
    Simple,
    Medium,
    Complex,
}

/// Coarse query intent, used to bias both top-K and strategy weights
/// (spec §4.3 stages 1 and 4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum QueryIntent {
    #[default]
    General,
    SymbolNavigation,
    FlowTracing,
    ConceptSearch,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryComplexity {
    pub token_count: usize,
    pub has_code_identifiers: bool,
    pub has_file_path: bool,
    pub has_boolean_operators: bool,
    pub specificity_score: f64,
}

impl QueryComplexity {
    #[must_use]
    pub fn analyze(query: &str) -> Self {
        let tokens: Vec<&str> = query.split_whitespace().collect();
        let token_count = tokens.len();
        let has_code_identifiers = tokens
            .iter()
            .any(|t| t.contains("::") || t.contains('_') || t.chars().any(char::is_uppercase) && t.len() > 2);
        let has_file_path = query.contains('/') || query.contains('.');
        let has_boolean_operators = ["and", "or", "not", "AND", "OR", "NOT"]
            .iter()
            .any(|op| tokens.contains(op));

        let mut specificity = 0.0_f64;
        if has_code_identifiers {
            specificity += 0.4;
        }
        if has_file_path {
            specificity += 0.3;
        }
        if token_count <= 3 {
            specificity += 0.3;
        }
        let specificity_score = specificity.min(1.0);

        Self {
            token_count,
            has_code_identifiers,
            has_file_path,
            has_boolean_operators,
            specificity_score,
        }
    }

    #[must_use]
    pub const fn complexity_level(&self) -> ComplexityLevel {
        if self.specificity_score >= 0.6 {
            ComplexityLevel::Simple
        } else if self.token_count > 8 || self.has_boolean_operators {
            ComplexityLevel::Complex
        } else {
            ComplexityLevel::Medium
        }
    }
}

/// Pick the adaptive top-K for `query` under `intent`, clamped to
/// `[config.min, config.max]`.
#[must_use]
pub fn select_top_k(query: &str, intent: QueryIntent, config: &AdaptiveTopK) -> u32 {
    let complexity = QueryComplexity::analyze(query);
    let base = match complexity.complexity_level() {
        ComplexityLevel::Simple => config.simple_k,
        ComplexityLevel::Medium => config.medium_k,
        ComplexityLevel::Complex => config.complex_k,
    };
    let intent_adjusted = match intent {
        QueryIntent::SymbolNavigation => base.min(config.simple_k.max(15)),
        QueryIntent::FlowTracing => base.max(config.complex_k.saturating_sub(10)),
        QueryIntent::ConceptSearch | QueryIntent::General => base,
    };
    intent_adjusted.clamp(config.min, config.max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_short_query_is_simple() {
        let c = QueryComplexity::analyze("UserService::authenticate");
        assert_eq!(c.complexity_level(), ComplexityLevel::Simple);
    }

    #[test]
    fn long_boolean_query_is_complex() {
        let c = QueryComplexity::analyze("find all places where auth AND session validation happens across the login flow");
        assert_eq!(c.complexity_level(), ComplexityLevel::Complex);
    }

    #[test]
    fn top_k_is_clamped_to_bounds() {
        let config = AdaptiveTopK {
            min: 5,
            max: 20,
            ..AdaptiveTopK::default()
        };
        let k = select_top_k("complex and broad query about the whole pipeline and all of its stages", QueryIntent::General, &config);
        assert!(k <= 20);
    }
}
