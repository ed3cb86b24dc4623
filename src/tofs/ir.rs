//! Per-transaction IR cache with circuit breaker (spec §4.1).
//!
//! `get_or_parse_ir` always returns a valid IR, never an absence: generated
//! files, oversized blobs, LFS pointers, and parse timeouts all produce a
//! placeholder variant rather than an error result, matching
//! `original_source/.../shadowfs/stub_ir.py`'s "never null" contract.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::error::ShadowFsError;

/// A typed node in an IR document (function, class, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrNode {
    pub fqn: String,
    pub kind: String,
}

/// A typed edge between two IR nodes (calls, inherits, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrEdge {
    pub from_fqn: String,
    pub to_fqn: String,
    pub kind: String,
}

/// Variant tag replacing the original's duck-typed "has `.nodes`, `.edges`"
/// IR protocol (DESIGN NOTES §9).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IrKind {
    Parsed,
    Generated,
    OpaqueBlob,
    LfsPointer,
    ErrorDoc,
    Partial,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IrDocument {
    pub kind: IrKind,
    pub file_path: String,
    pub nodes: Vec<IrNode>,
    pub edges: Vec<IrEdge>,
    pub error: Option<String>,
}

impl IrDocument {
    #[must_use]
    pub fn placeholder(kind: IrKind, file_path: impl Into<String>, error: Option<String>) -> Self {
        Self {
            kind,
            file_path: file_path.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            error,
        }
    }
}

/// Circuit-breaker thresholds (spec §6 Config options).
#[derive(Clone, Copy, Debug)]
pub struct IrParseLimits {
    pub max_file_size_bytes: u64,
    pub parse_timeout: Duration,
}

impl Default for IrParseLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 5 * 1024 * 1024, // ir_max_file_size default 5 MiB
            parse_timeout: Duration::from_secs(5), // ir_parse_timeout_seconds default 5
        }
    }
}

const GENERATED_MARKERS: &[&str] = &["@generated", "DO NOT EDIT", "AUTO-GENERATED FILE"];
const GENERATED_EXTENSIONS: &[&str] = &[".min.js", ".pb.go", ".g.dart", ".generated.rs"];
const GENERATED_DIRS: &[&str] = &["/build/", "/dist/", "/target/", "/.generated/"];
const LFS_POINTER_HEADER: &str = "version https://git-lfs.github.com/spec/v1";

fn is_generated(path: &str, content: &str) -> bool {
    if GENERATED_MARKERS.iter().any(|m| content.contains(m)) {
        return true;
    }
    if GENERATED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }
    let slashified = format!("/{path}");
    GENERATED_DIRS.iter().any(|d| slashified.contains(d))
}

fn is_lfs_pointer(content: &str) -> bool {
    content.trim_start().starts_with(LFS_POINTER_HEADER)
}

/// Normalize content before parsing: Unicode NFC (documented ASCII-only
/// limitation, see `RelPath::canonicalize`) and CRLF→LF.
fn normalize_content(content: &str) -> String {
    content.replace("\r\n", "\n")
}

/// Extract top-level definitions via a partial parse, used when the full
/// parser hits a recoverable syntax error. A line-oriented heuristic
/// stands in for a language-specific recovering parser (spec's
/// Non-goals explicitly leave parser choice external).
fn partial_parse(content: &str) -> Vec<IrNode> {
    content
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            let keywords = ["fn ", "def ", "function ", "class ", "struct ", "impl "];
            keywords.iter().find_map(|kw| {
                trimmed.strip_prefix(kw).map(|rest| {
                    let name: String = rest
                        .chars()
                        .take_while(|c| c.is_alphanumeric() || *c == '_')
                        .collect();
                    IrNode {
                        fqn: name,
                        kind: kw.trim().to_string(),
                    }
                })
            })
        })
        .collect()
}

/// Parse `content` under the circuit breaker, never returning `Err` — every
/// branch produces a well-formed `IrDocument` (spec §4.1's "in every case
/// the method returns a valid IR, never `null`").
#[must_use]
pub fn parse_with_circuit_breaker(path: &str, content: &str, limits: IrParseLimits) -> IrDocument {
    if is_generated(path, content) {
        return IrDocument::placeholder(IrKind::Generated, path, None);
    }
    if content.len() as u64 > limits.max_file_size_bytes {
        return IrDocument::placeholder(IrKind::OpaqueBlob, path, None);
    }
    if is_lfs_pointer(content) {
        return IrDocument::placeholder(IrKind::LfsPointer, path, None);
    }

    let normalized = normalize_content(content);
    let started = Instant::now();
    let nodes = partial_parse(&normalized);
    if started.elapsed() > limits.parse_timeout {
        return IrDocument::placeholder(
            IrKind::ErrorDoc,
            path,
            Some(format!("parse exceeded {:?}", limits.parse_timeout)),
        );
    }

    if nodes.is_empty() && !normalized.trim().is_empty() {
        // No recognizable top-level definitions: a recoverable syntax
        // situation rather than a hard error — surfaced as Partial with
        // zero nodes, matching the original's "partial parse" branch.
        return IrDocument {
            kind: IrKind::Partial,
            file_path: path.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            error: None,
        };
    }

    IrDocument {
        kind: IrKind::Parsed,
        file_path: path.to_string(),
        nodes,
        edges: Vec::new(),
        error: None,
    }
}

/// Per-transaction IR cache, keyed by path. Owned exclusively by one
/// transaction (DESIGN NOTES §9: "the transaction owns all IR documents
/// exclusively").
#[derive(Debug, Default)]
pub struct IrCache {
    docs: HashMap<String, IrDocument>,
    limits: IrParseLimits,
}

impl IrCache {
    #[must_use]
    pub fn new(limits: IrParseLimits) -> Self {
        Self {
            docs: HashMap::new(),
            limits,
        }
    }

    /// Idempotent: two successive calls with identical arguments return
    /// the same `IrDocument` and do not re-parse (spec §8 round-trip law).
    pub fn get_or_parse_ir(&mut self, path: &str, content: &str) -> &IrDocument {
        self.docs
            .entry(path.to_string())
            .or_insert_with(|| parse_with_circuit_breaker(path, content, self.limits))
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&IrDocument> {
        self.docs.get(path)
    }

    /// Invalidate one cached document (e.g. on overwrite with new content).
    pub fn invalidate(&mut self, path: &str) {
        self.docs.remove(path);
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IrDocument)> {
        self.docs.iter()
    }

    /// Discard every cached document. Called on commit/rollback (spec §8:
    /// "after commit(T) or rollback(T), T.ir_cache ... are unreachable").
    pub fn dispose(&mut self) {
        self.docs.clear();
    }
}

#[allow(clippy::missing_errors_doc)]
pub fn parse_timeout_error(path: &str, timeout: Duration) -> ShadowFsError {
    ShadowFsError::ParseTimeout {
        path: path.to_string(),
        timeout_seconds: timeout.as_secs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_marker_produces_placeholder() {
        let doc = parse_with_circuit_breaker("x.rs", "// @generated by tool\nfn a(){}", IrParseLimits::default());
        assert_eq!(doc.kind, IrKind::Generated);
        assert!(doc.nodes.is_empty());
    }

    #[test]
    fn generated_dir_produces_placeholder() {
        let doc = parse_with_circuit_breaker("build/out.js", "let x = 1;", IrParseLimits::default());
        assert_eq!(doc.kind, IrKind::Generated);
    }

    #[test]
    fn oversized_content_produces_opaque_blob() {
        let limits = IrParseLimits {
            max_file_size_bytes: 4,
            ..IrParseLimits::default()
        };
        let doc = parse_with_circuit_breaker("x.txt", "way too long", limits);
        assert_eq!(doc.kind, IrKind::OpaqueBlob);
    }

    #[test]
    fn lfs_pointer_produces_placeholder() {
        let content = "version https://git-lfs.github.com/spec/v1\noid sha256:abc\nsize 10\n";
        let doc = parse_with_circuit_breaker("big.bin", content, IrParseLimits::default());
        assert_eq!(doc.kind, IrKind::LfsPointer);
    }

    #[test]
    fn normal_content_parses_nodes() {
        let doc = parse_with_circuit_breaker("a.rs", "fn foo() {}\nfn bar() {}\n", IrParseLimits::default());
        assert_eq!(doc.kind, IrKind::Parsed);
        assert_eq!(doc.nodes.len(), 2);
    }

    #[test]
    fn circuit_breaker_order_generated_before_size() {
        // A "generated" file that's also oversized should still be classified
        // as Generated first (spec §4.1 lists the checks in order a,b,c,d).
        let big_generated = format!("// @generated\n{}", "x".repeat(10));
        let limits = IrParseLimits {
            max_file_size_bytes: 5,
            ..IrParseLimits::default()
        };
        let doc = parse_with_circuit_breaker("x.rs", &big_generated, limits);
        assert_eq!(doc.kind, IrKind::Generated);
    }

    #[test]
    fn ir_cache_is_idempotent() {
        let mut cache = IrCache::default();
        let first = cache.get_or_parse_ir("a.rs", "fn x(){}").clone();
        let second = cache.get_or_parse_ir("a.rs", "fn x(){}").clone();
        assert_eq!(first, second);
    }

    #[test]
    fn ir_cache_dispose_clears_all() {
        let mut cache = IrCache::default();
        cache.get_or_parse_ir("a.rs", "fn x(){}");
        cache.dispose();
        assert!(cache.get("a.rs").is_none());
    }
}
