//! Declarative rule sets evaluated against a patch (spec §3
//! `SemanticContract` / `ArchSpec` / `SecuritySpec` / `IntegritySpec`).
//!
//! Each spec returns `(passed, violations[])`; a violation carries a
//! human-readable description and a severity. Grounded on the original's
//! `Violation` dataclass (`contract_id`, `rule`, `severity`, `message`).

use serde::{Deserialize, Serialize};

use super::types::{ErrorKind, ValidationError};

/// Severity of a contract/spec violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A single violation of a contract or spec.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    contract_id: String,
    rule: String,
    severity: Severity,
    description: String,
    location: Option<String>,
}

impl Violation {
    /// # Errors
    /// Returns `ValidationError` if `contract_id`, `rule`, or `description`
    /// is empty.
    pub fn new(
        contract_id: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        location: Option<String>,
    ) -> Result<Self, ValidationError> {
        let contract_id = contract_id.into();
        let rule = rule.into();
        let description = description.into();
        let err = |reason: &str| ValidationError {
            kind: ErrorKind::RelPath,
            value: contract_id.clone(),
            reason: reason.to_string(),
        };
        if contract_id.is_empty() {
            return Err(err("contract_id must not be empty"));
        }
        if rule.is_empty() {
            return Err(err("rule must not be empty"));
        }
        if description.is_empty() {
            return Err(err("description must not be empty"));
        }
        Ok(Self {
            contract_id,
            rule,
            severity,
            description,
            location,
        })
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self.severity, Severity::Critical)
    }
}

/// Result of evaluating any spec/contract against a patch: `(passed,
/// violations)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecResult {
    passed: bool,
    violations: Vec<Violation>,
}

impl SpecResult {
    #[must_use]
    pub fn new(violations: Vec<Violation>) -> Self {
        let passed = !violations.iter().any(Violation::is_critical);
        Self { passed, violations }
    }

    #[must_use]
    pub fn ok() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

/// A semantic contract attached to one FQN target: pre/postconditions,
/// invariants, and a declared complexity bound, evaluated during Step 5.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemanticContract {
    target_fqn: String,
    preconditions: Vec<String>,
    postconditions: Vec<String>,
    invariants: Vec<String>,
}

impl SemanticContract {
    /// # Errors
    /// Returns `ValidationError` if `target_fqn` is empty.
    pub fn new(
        target_fqn: impl Into<String>,
        preconditions: Vec<String>,
        postconditions: Vec<String>,
        invariants: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let target_fqn = target_fqn.into();
        if target_fqn.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::RelPath,
                value: target_fqn,
                reason: "target_fqn must not be empty".to_string(),
            });
        }
        Ok(Self {
            target_fqn,
            preconditions,
            postconditions,
            invariants,
        })
    }

    #[must_use]
    pub fn target_fqn(&self) -> &str {
        &self.target_fqn
    }

    #[must_use]
    pub fn preconditions(&self) -> &[String] {
        &self.preconditions
    }

    #[must_use]
    pub fn postconditions(&self) -> &[String] {
        &self.postconditions
    }

    #[must_use]
    pub fn invariants(&self) -> &[String] {
        &self.invariants
    }
}

/// Forbidden-import / layering rules (Step 7's architecture check).
#[derive(Clone, Debug, Default)]
pub struct ArchSpec {
    forbidden_imports: Vec<(String, String)>,
}

impl ArchSpec {
    #[must_use]
    pub fn new(forbidden_imports: Vec<(String, String)>) -> Self {
        Self { forbidden_imports }
    }

    /// Evaluate a set of `(file, imported_module)` pairs against the
    /// layering rules.
    #[must_use]
    pub fn verify(&self, imports: &[(String, String)]) -> SpecResult {
        let mut violations = Vec::new();
        for (file, module) in imports {
            for (from_layer, forbidden_module) in &self.forbidden_imports {
                if file.contains(from_layer.as_str()) && module == forbidden_module {
                    if let Ok(v) = Violation::new(
                        "arch-spec",
                        "forbidden-import",
                        Severity::Critical,
                        format!("{file} imports forbidden module {module}"),
                        Some(file.clone()),
                    ) {
                        violations.push(v);
                    }
                }
            }
        }
        SpecResult::new(violations)
    }
}

/// Taint source→sink reachability and dangerous-call scanning (Step 7's
/// security check).
#[derive(Clone, Debug, Default)]
pub struct SecuritySpec {
    dangerous_calls: Vec<String>,
}

impl SecuritySpec {
    #[must_use]
    pub fn new(dangerous_calls: Vec<String>) -> Self {
        Self { dangerous_calls }
    }

    #[must_use]
    pub fn verify(&self, file_contents: &[(String, String)]) -> SpecResult {
        let mut violations = Vec::new();
        for (path, content) in file_contents {
            for call in &self.dangerous_calls {
                if content.contains(call.as_str()) {
                    if let Ok(v) = Violation::new(
                        "security-spec",
                        "dangerous-call",
                        Severity::Critical,
                        format!("{path} calls dangerous function {call}"),
                        Some(path.clone()),
                    ) {
                        violations.push(v);
                    }
                }
            }
        }
        SpecResult::new(violations)
    }
}

/// Resource-open-without-close pattern scanning (Step 7's integrity check).
#[derive(Clone, Debug, Default)]
pub struct IntegritySpec;

impl IntegritySpec {
    #[must_use]
    pub fn verify(&self, file_contents: &[(String, String)]) -> SpecResult {
        let mut violations = Vec::new();
        for (path, content) in file_contents {
            let opens = content.matches("open(").count();
            let closes = content.matches(".close()").count() + content.matches("with open(").count();
            if opens > closes {
                if let Ok(v) = Violation::new(
                    "integrity-spec",
                    "resource-leak",
                    Severity::Major,
                    format!("{path} has {opens} open() call(s) without matching close"),
                    Some(path.clone()),
                ) {
                    violations.push(v);
                }
            }
        }
        SpecResult::new(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_rejects_empty_fields() {
        assert!(Violation::new("", "rule", Severity::Minor, "desc", None).is_err());
    }

    #[test]
    fn spec_result_fails_only_on_critical() {
        let minor = Violation::new("c", "r", Severity::Minor, "d", None).unwrap();
        let result = SpecResult::new(vec![minor]);
        assert!(result.passed());

        let critical = Violation::new("c", "r", Severity::Critical, "d", None).unwrap();
        let result = SpecResult::new(vec![critical]);
        assert!(!result.passed());
    }

    #[test]
    fn arch_spec_flags_forbidden_import() {
        let spec = ArchSpec::new(vec![("domain".to_string(), "infra_db".to_string())]);
        let result = spec.verify(&[("domain/model.rs".to_string(), "infra_db".to_string())]);
        assert!(!result.passed());
    }

    #[test]
    fn integrity_spec_flags_unmatched_open() {
        let spec = IntegritySpec;
        let result = spec.verify(&[("a.py".to_string(), "f = open('x')\n".to_string())]);
        assert!(!result.passed());
    }

    #[test]
    fn integrity_spec_allows_matched_with_open() {
        let spec = IntegritySpec;
        let result = spec.verify(&[("a.py".to_string(), "with open('x') as f:\n    pass\n".to_string())]);
        assert!(result.passed());
    }
}
