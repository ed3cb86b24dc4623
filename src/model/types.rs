//! Validated scalar newtypes shared across the domain model.
//!
//! Every value that crosses a trust boundary (a path from an LLM patch, a
//! hash from a capability port, an agent identifier from the coordinator)
//! is parsed once into one of these types and carried validated from then
//! on, rather than re-checked ad hoc at each use site.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What kind of value failed validation, for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    RelPath,
    Sha256Hex,
    AgentId,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RelPath => "relative path",
            Self::Sha256Hex => "sha256 hex digest",
            Self::AgentId => "agent id",
        };
        f.write_str(s)
    }
}

/// A validation failure, carrying enough context for an agent-facing caller
/// to fix the input without re-deriving what went wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?} — {}", self.kind, self.value, self.reason)
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// RelPath
// ---------------------------------------------------------------------------

/// A workspace-relative path: non-empty, relative, no `..` components, no
/// null bytes or newlines, not absolute. This is the path representation
/// `Patch`, `FileChange`, and TOFS all share — spec §8's universally
/// quantified path invariant is enforced once, here.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelPath(String);

impl RelPath {
    /// # Errors
    /// Returns `ValidationError` if `s` is empty, absolute, contains a `..`
    /// component, or contains a null byte or newline.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        let err = |reason: &str| ValidationError {
            kind: ErrorKind::RelPath,
            value: s.to_string(),
            reason: reason.to_string(),
        };
        if s.is_empty() {
            return Err(err("path must not be empty"));
        }
        if Path::new(s).is_absolute() || s.starts_with('/') {
            return Err(err("path must be relative"));
        }
        if s.contains('\0') {
            return Err(err("path must not contain a null byte"));
        }
        if s.contains('\n') || s.contains('\r') {
            return Err(err("path must not contain a newline"));
        }
        if s.split('/').any(|seg| seg == "..") {
            return Err(err("path must not contain a `..` component"));
        }
        Ok(())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize separators (`\` → `/`) before validating. Full Unicode NFC
    /// normalization is a documented limitation (ASCII-dominant paths are
    /// the common case); ties into spec §4.1's path canonicalization rule.
    pub fn canonicalize(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.replace('\\', "/");
        Self::new(normalized)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RelPath {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RelPath {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RelPath> for String {
    fn from(p: RelPath) -> Self {
        p.0
    }
}

impl Serialize for RelPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RelPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Sha256Hex
// ---------------------------------------------------------------------------

/// A sha256 digest in canonical lowercase-hex form: exactly 64 hex chars.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha256Hex(String);

impl Sha256Hex {
    /// # Errors
    /// Returns `ValidationError` if `s` is not 64 lowercase hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        let err = |reason: &str| ValidationError {
            kind: ErrorKind::Sha256Hex,
            value: s.to_string(),
            reason: reason.to_string(),
        };
        if s.len() != 64 {
            return Err(err("must be exactly 64 characters"));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return Err(err("must be lowercase hexadecimal"));
        }
        Ok(())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compute the sha256 digest of `bytes` directly, in canonical form.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        Self(hex_lower(&digest))
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

impl fmt::Display for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Sha256Hex {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Sha256Hex {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Sha256Hex> for String {
    fn from(h: Sha256Hex) -> Self {
        h.0
    }
}

impl Serialize for Sha256Hex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Sha256Hex {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// AgentId
// ---------------------------------------------------------------------------

/// An agent identifier: non-empty, at most 64 bytes, ASCII
/// alphanumeric/hyphen/underscore. Mirrors `WorkspaceId`'s validation shape
/// in the teacher repo.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(String);

impl AgentId {
    pub const MAX_LEN: usize = 64;

    /// # Errors
    /// Returns `ValidationError` if `s` is empty, too long, or contains a
    /// character outside `[A-Za-z0-9_-]`.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        let err = |reason: &str| ValidationError {
            kind: ErrorKind::AgentId,
            value: s.to_string(),
            reason: reason.to_string(),
        };
        if s.is_empty() {
            return Err(err("agent id must not be empty"));
        }
        if s.len() > Self::MAX_LEN {
            return Err(err("agent id exceeds max length of 64"));
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
            return Err(err("agent id must be [A-Za-z0-9_-]"));
        }
        Ok(())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AgentId {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AgentId {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

impl Serialize for AgentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AgentId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relpath_rejects_absolute() {
        assert!(RelPath::new("/etc/passwd").is_err());
    }

    #[test]
    fn relpath_rejects_dotdot() {
        assert!(RelPath::new("a/../b").is_err());
        assert!(RelPath::new("..").is_err());
    }

    #[test]
    fn relpath_rejects_null_and_newline() {
        assert!(RelPath::new("a\0b").is_err());
        assert!(RelPath::new("a\nb").is_err());
    }

    #[test]
    fn relpath_accepts_simple_relative() {
        let p = RelPath::new("src/main.rs").unwrap();
        assert_eq!(p.as_str(), "src/main.rs");
    }

    #[test]
    fn relpath_canonicalize_normalizes_separators() {
        let p = RelPath::canonicalize("src\\main.rs").unwrap();
        assert_eq!(p.as_str(), "src/main.rs");
    }

    #[test]
    fn relpath_display_roundtrips() {
        let p = RelPath::new("a/b.txt").unwrap();
        assert_eq!(p.to_string(), "a/b.txt");
        let s: String = p.clone().into();
        assert_eq!(RelPath::new(s).unwrap(), p);
    }

    #[test]
    fn sha256_rejects_wrong_length() {
        assert!(Sha256Hex::new("abc").is_err());
    }

    #[test]
    fn sha256_rejects_uppercase() {
        let bad = "A".repeat(64);
        assert!(Sha256Hex::new(bad).is_err());
    }

    #[test]
    fn sha256_of_empty_matches_known_digest() {
        let h = Sha256Hex::of(b"");
        assert_eq!(
            h.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn agentid_rejects_too_long() {
        let bad = "a".repeat(65);
        assert!(AgentId::new(bad).is_err());
    }

    #[test]
    fn agentid_rejects_bad_chars() {
        assert!(AgentId::new("agent one").is_err());
    }

    #[test]
    fn agentid_accepts_hyphen_underscore() {
        assert!(AgentId::new("agent-one_2").is_ok());
    }

    #[test]
    fn validation_error_display_includes_kind_and_reason() {
        let e = RelPath::new("/abs").unwrap_err();
        let msg = e.to_string();
        assert!(msg.contains("relative path"));
        assert!(msg.contains("relative"));
    }
}
