//! Resource budget (spec §3 `Budget`).
//!
//! Five monotone counters paired with caps. All caps must be positive, all
//! current values non-negative; `is_exceeded` is the OR of per-dimension
//! saturation. Operations return new budgets (value semantics), matching
//! the original's `Budget.with_usage`.

use serde::{Deserialize, Serialize};

use super::types::{ErrorKind, ValidationError};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    max_iterations: u32,
    max_tokens: u64,
    max_time_seconds: f64,
    max_llm_calls: u32,
    max_test_runs: u32,

    current_iterations: u32,
    current_tokens: u64,
    current_time_seconds: f64,
    current_llm_calls: u32,
    current_test_runs: u32,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_tokens: 100_000,
            max_time_seconds: 300.0,
            max_llm_calls: 50,
            max_test_runs: 20,
            current_iterations: 0,
            current_tokens: 0,
            current_time_seconds: 0.0,
            current_llm_calls: 0,
            current_test_runs: 0,
        }
    }
}

/// Cap values for a fresh `Budget`, mirroring the Python dataclass's
/// constructor-argument defaults.
#[derive(Clone, Copy, Debug)]
pub struct BudgetCaps {
    pub max_iterations: u32,
    pub max_tokens: u64,
    pub max_time_seconds: f64,
    pub max_llm_calls: u32,
    pub max_test_runs: u32,
}

impl Default for BudgetCaps {
    fn default() -> Self {
        let d = Budget::default();
        Self {
            max_iterations: d.max_iterations,
            max_tokens: d.max_tokens,
            max_time_seconds: d.max_time_seconds,
            max_llm_calls: d.max_llm_calls,
            max_test_runs: d.max_test_runs,
        }
    }
}

impl Budget {
    /// # Errors
    /// Returns `ValidationError` if any cap is non-positive.
    pub fn new(caps: BudgetCaps) -> Result<Self, ValidationError> {
        let err = |reason: &str| ValidationError {
            kind: ErrorKind::RelPath,
            value: "Budget".to_string(),
            reason: reason.to_string(),
        };
        if caps.max_iterations == 0 {
            return Err(err("max_iterations must be > 0"));
        }
        if caps.max_tokens == 0 {
            return Err(err("max_tokens must be > 0"));
        }
        if caps.max_time_seconds <= 0.0 {
            return Err(err("max_time_seconds must be > 0"));
        }
        if caps.max_llm_calls == 0 {
            return Err(err("max_llm_calls must be > 0"));
        }
        if caps.max_test_runs == 0 {
            return Err(err("max_test_runs must be > 0"));
        }
        Ok(Self {
            max_iterations: caps.max_iterations,
            max_tokens: caps.max_tokens,
            max_time_seconds: caps.max_time_seconds,
            max_llm_calls: caps.max_llm_calls,
            max_test_runs: caps.max_test_runs,
            current_iterations: 0,
            current_tokens: 0,
            current_time_seconds: 0.0,
            current_llm_calls: 0,
            current_test_runs: 0,
        })
    }

    #[must_use]
    pub const fn is_exceeded(&self) -> bool {
        self.current_iterations >= self.max_iterations
            || self.current_tokens >= self.max_tokens
            || self.current_time_seconds >= self.max_time_seconds
            || self.current_llm_calls >= self.max_llm_calls
            || self.current_test_runs >= self.max_test_runs
    }

    #[must_use]
    pub const fn remaining_iterations(&self) -> u32 {
        self.max_iterations.saturating_sub(self.current_iterations)
    }

    /// Highest of the five per-dimension usage ratios, in `[0, ~)`.
    /// Ported from `Budget.usage_ratio` in the original implementation —
    /// used by the coordinator/CLI to report overall pressure.
    #[must_use]
    pub fn usage_ratio(&self) -> f64 {
        let ratios = [
            f64::from(self.current_iterations) / f64::from(self.max_iterations),
            self.current_tokens as f64 / self.max_tokens as f64,
            self.current_time_seconds / self.max_time_seconds,
            f64::from(self.current_llm_calls) / f64::from(self.max_llm_calls),
            f64::from(self.current_test_runs) / f64::from(self.max_test_runs),
        ];
        ratios.into_iter().fold(0.0_f64, f64::max)
    }

    #[must_use]
    pub fn with_usage(
        &self,
        iterations: u32,
        tokens: u64,
        time_seconds: f64,
        llm_calls: u32,
        test_runs: u32,
    ) -> Self {
        Self {
            current_iterations: self.current_iterations + iterations,
            current_tokens: self.current_tokens + tokens,
            current_time_seconds: self.current_time_seconds + time_seconds,
            current_llm_calls: self.current_llm_calls + llm_calls,
            current_test_runs: self.current_test_runs + test_runs,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_caps() {
        let mut caps = BudgetCaps::default();
        caps.max_iterations = 0;
        assert!(Budget::new(caps).is_err());
    }

    #[test]
    fn is_exceeded_is_or_of_dimensions() {
        let b = Budget::default();
        assert!(!b.is_exceeded());
        let b = b.with_usage(10, 0, 0.0, 0, 0);
        assert!(b.is_exceeded());
    }

    #[test]
    fn with_usage_is_additive_and_immutable() {
        let b = Budget::default();
        let b2 = b.with_usage(1, 100, 1.0, 1, 0);
        assert_eq!(b.remaining_iterations(), 10);
        assert_eq!(b2.remaining_iterations(), 9);
    }

    #[test]
    fn usage_ratio_is_max_of_dimensions() {
        let b = Budget::default().with_usage(5, 0, 0.0, 0, 0);
        assert!((b.usage_ratio() - 0.5).abs() < 1e-9);
    }
}
