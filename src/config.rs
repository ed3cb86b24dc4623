//! Weft runtime configuration (`.weft/config.toml`).
//!
//! Layered precedence: built-in defaults → `$WEFT_CONFIG` or
//! `<repo>/.weft/config.toml` → environment overrides (`WEFT_LOG_LEVEL`,
//! `WEFT_MAX_ITERATIONS`). Every field is backed by a `default_*` function so
//! a config file missing a section still resolves to a complete, sane
//! `WeftConfig` — matching the teacher's `ManifoldConfig::load` shape.
//! Unknown keys are a hard error (`deny_unknown_fields`): a typo in a config
//! file should fail loudly, not silently no-op.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level weft runtime configuration.
///
/// Parsed from `.weft/config.toml`. Missing fields use sensible defaults.
/// Missing file → all defaults (no error).
#[derive(Clone, Debug, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct WeftConfig {
    /// Patch-pipeline loop bounds and thresholds (component C5).
    pub pipeline: PipelineConfig,

    /// Transactional overlay filesystem limits (component C2).
    pub tofs: TofsConfig,

    /// Soft-lock manager settings (component C3).
    pub lock: LockConfig,

    /// Hybrid retrieval pipeline tuning (component C4).
    pub retrieval: RetrievalConfig,
}

impl WeftConfig {
    /// Load config from `path`, falling back to all-defaults if the file
    /// does not exist.
    ///
    /// # Errors
    /// Returns `crate::WeftError::Config` if the file exists but fails to
    /// parse, or declares an unrecognized field.
    pub fn load(path: &Path) -> Result<Self, crate::WeftError> {
        let Ok(raw) = std::fs::read_to_string(path) else {
            return Ok(Self::default());
        };
        let mut config: Self = toml::from_str(&raw).map_err(|e| crate::WeftError::Config {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve the config path: `$WEFT_CONFIG` if set, else
    /// `<repo_root>/.weft/config.toml`.
    #[must_use]
    pub fn resolve_path(repo_root: &Path) -> std::path::PathBuf {
        std::env::var_os("WEFT_CONFIG").map_or_else(|| repo_root.join(".weft").join("config.toml"), Into::into)
    }

    /// Apply `WEFT_LOG_LEVEL`/`WEFT_MAX_ITERATIONS` env overrides on top of
    /// whatever the file (or defaults) produced. Env always wins.
    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("WEFT_MAX_ITERATIONS")
            && let Ok(n) = raw.parse::<u32>()
        {
            self.pipeline.max_iterations = n;
        }
    }

    /// The effective `tracing` filter directive, honoring `WEFT_LOG_LEVEL`
    /// (falls back to `"info"` — the subscriber layer itself still respects
    /// `RUST_LOG` if set, per `tracing-subscriber`'s `EnvFilter` precedence).
    #[must_use]
    pub fn log_level(&self) -> String {
        std::env::var("WEFT_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned())
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Bounds and thresholds for the 8-step patch pipeline loop (spec §4.4, §6
/// "Config options").
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PipelineConfig {
    pub max_iterations: u32,
    pub max_tokens: u64,
    pub max_time_seconds: u64,
    pub max_llm_calls: u32,
    pub max_test_runs: u32,
    pub convergence_threshold: f64,
    pub oscillation_window_size: usize,
    pub oscillation_similarity_threshold: f64,
    /// Glob patterns for paths the pipeline must never touch (e.g.
    /// `.git/**`, `target/**`).
    pub forbidden_paths: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_tokens: default_max_tokens(),
            max_time_seconds: default_max_time_seconds(),
            max_llm_calls: default_max_llm_calls(),
            max_test_runs: default_max_test_runs(),
            convergence_threshold: default_convergence_threshold(),
            oscillation_window_size: default_oscillation_window_size(),
            oscillation_similarity_threshold: default_oscillation_similarity_threshold(),
            forbidden_paths: default_forbidden_paths(),
        }
    }
}

const fn default_max_iterations() -> u32 {
    20
}
const fn default_max_tokens() -> u64 {
    200_000
}
const fn default_max_time_seconds() -> u64 {
    1800
}
const fn default_max_llm_calls() -> u32 {
    20
}
const fn default_max_test_runs() -> u32 {
    40
}
const fn default_convergence_threshold() -> f64 {
    0.95
}
const fn default_oscillation_window_size() -> usize {
    3
}
const fn default_oscillation_similarity_threshold() -> f64 {
    0.85
}
fn default_forbidden_paths() -> Vec<String> {
    vec![".git/**".to_owned(), "target/**".to_owned(), ".weft/**".to_owned()]
}

// ---------------------------------------------------------------------------
// TofsConfig
// ---------------------------------------------------------------------------

/// Transactional overlay filesystem limits (spec §4.1, §6 "Config options").
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TofsConfig {
    /// Files larger than this are not parsed into an IR (bytes).
    pub ir_max_file_size: u64,
    pub ir_parse_timeout_seconds: u64,
    /// Whether callers must explicitly dispose cached IR rather than relying
    /// on transaction-end cleanup.
    pub explicit_ir_dispose: bool,
}

impl Default for TofsConfig {
    fn default() -> Self {
        Self {
            ir_max_file_size: default_ir_max_file_size(),
            ir_parse_timeout_seconds: default_ir_parse_timeout_seconds(),
            explicit_ir_dispose: default_explicit_ir_dispose(),
        }
    }
}

const fn default_ir_max_file_size() -> u64 {
    5 * 1024 * 1024
}
const fn default_ir_parse_timeout_seconds() -> u64 {
    5
}
const fn default_explicit_ir_dispose() -> bool {
    false
}

// ---------------------------------------------------------------------------
// LockConfig
// ---------------------------------------------------------------------------

/// Soft-lock manager settings (spec §4.2).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LockConfig {
    pub lock_ttl_seconds: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_ttl_seconds: default_lock_ttl_seconds(),
        }
    }
}

const fn default_lock_ttl_seconds() -> u64 {
    300
}

// ---------------------------------------------------------------------------
// RetrievalConfig
// ---------------------------------------------------------------------------

/// Hybrid retrieval pipeline tuning (spec §4.3, §6 "Config options").
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetrievalConfig {
    pub adaptive_top_k: AdaptiveTopK,
    /// Reciprocal rank fusion constant.
    pub rrf_k: u32,
    pub consensus_boost_base: f64,
    pub consensus_max_strategies: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            adaptive_top_k: AdaptiveTopK::default(),
            rrf_k: default_rrf_k(),
            consensus_boost_base: default_consensus_boost_base(),
            consensus_max_strategies: default_consensus_max_strategies(),
        }
    }
}

const fn default_rrf_k() -> u32 {
    60
}
const fn default_consensus_boost_base() -> f64 {
    0.35
}
const fn default_consensus_max_strategies() -> u32 {
    4
}

/// Adaptive top-k bounds for the retrieval pipeline's candidate window.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AdaptiveTopK {
    pub min: u32,
    pub default: u32,
    pub max: u32,
}

impl Default for AdaptiveTopK {
    fn default() -> Self {
        Self {
            min: 10,
            default: 30,
            max: 100,
        }
    }
}

impl fmt::Display for WeftConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WeftConfig {{ max_iterations: {}, lock_ttl_seconds: {}, rrf_k: {} }}",
            self.pipeline.max_iterations, self.lock.lock_ttl_seconds, self.retrieval.rrf_k
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = WeftConfig::load(Path::new("/nonexistent/.weft/config.toml")).unwrap();
        assert_eq!(config.pipeline.max_iterations, default_max_iterations());
        assert_eq!(config.retrieval.rrf_k, 60);
    }

    #[test]
    fn partial_toml_fills_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nmax_iterations = 5\n").unwrap();
        let config = WeftConfig::load(&path).unwrap();
        assert_eq!(config.pipeline.max_iterations, 5);
        assert_eq!(config.pipeline.convergence_threshold, 0.95);
        assert_eq!(config.lock.lock_ttl_seconds, 300);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nnonexistent_field = 1\n").unwrap();
        assert!(WeftConfig::load(&path).is_err());
    }

    #[test]
    fn env_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nmax_iterations = 5\n").unwrap();
        // SAFETY-equivalent: tests run single-threaded per process here would
        // be ideal, but std::env::set_var is the teacher's own pattern for
        // this kind of override test; scope the var to this test only.
        unsafe {
            std::env::set_var("WEFT_MAX_ITERATIONS", "9");
        }
        let config = WeftConfig::load(&path).unwrap();
        unsafe {
            std::env::remove_var("WEFT_MAX_ITERATIONS");
        }
        assert_eq!(config.pipeline.max_iterations, 9);
    }
}
