//! Non-fatal findings of a validation pass or a short-circuit run.
//!
//! A branch left out below the low-impedance threshold, a norm coefficient
//! falling back to 1, an island with no source, a duplicated common-support
//! bus pair: none of these abort the run, but the caller gets to see them.
//! Each finding is logged through `tracing` where it happens and recorded
//! here.
//!
//! ```
//! use faultline_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity("topology", "reactance below threshold, branch skipped", "L7");
//! diag.add_error("structure", "network has no buses");
//!
//! assert_eq!(diag.summary(), "1 warning, 1 error");
//! ```

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The run went on with a documented fallback
    Warning,
    /// The data cannot be used as given
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// "structure", "reference", "topology", "norm", "duplicate-pair", ...
    pub category: String,
    pub message: String,
    /// Equipment or fault id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.entity {
            Some(entity) => write!(f, "{severity} [{}] {}: {}", self.category, entity, self.message),
            None => write!(f, "{severity} [{}] {}", self.category, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, category: &str, message: &str, entity: Option<&str>) {
        self.issues.push(DiagnosticIssue {
            severity,
            category: category.to_string(),
            message: message.to_string(),
            entity: entity.map(str::to_string),
        });
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.push(Severity::Warning, category, message, None);
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.push(Severity::Warning, category, message, Some(entity));
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.push(Severity::Error, category, message, None);
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.push(Severity::Error, category, message, Some(entity));
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Append the issues of a nested step, keeping their order.
    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let count = |n: usize, word: &str| format!("{n} {word}{}", if n == 1 { "" } else { "s" });
        match (self.warning_count(), self.error_count()) {
            (0, 0) => "no issues".to_string(),
            (w, 0) => count(w, "warning"),
            (0, e) => count(e, "error"),
            (w, e) => format!("{}, {}", count(w, "warning"), count(e, "error")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_by_severity() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "no issues");

        diag.add_warning("norm", "kT set to 1");
        diag.add_warning_with_entity("topology", "branch skipped", "L1");
        assert_eq!(diag.summary(), "2 warnings");
        assert!(!diag.has_errors());

        diag.add_error_with_entity("reference", "unknown bus", "G3");
        assert_eq!(diag.summary(), "2 warnings, 1 error");
        assert_eq!(diag.errors().next().unwrap().entity.as_deref(), Some("G3"));
    }

    #[test]
    fn test_merge_keeps_categories() {
        let mut run = Diagnostics::new();
        run.add_warning("duplicate-pair", "pair already solved");
        let mut validation = Diagnostics::new();
        validation.add_warning("topology", "island without source");

        run.merge(validation);
        assert_eq!(run.issues_by_category("topology").count(), 1);
        assert_eq!(run.issues_by_category("duplicate-pair").count(), 1);
        assert_eq!(run.issues[1].category, "topology");
    }

    #[test]
    fn test_issue_display_names_entity() {
        let mut diag = Diagnostics::new();
        diag.add_warning_with_entity("topology", "branch skipped", "T4");
        diag.add_error("structure", "network has no buses");
        assert_eq!(diag.issues[0].to_string(), "warning [topology] T4: branch skipped");
        assert_eq!(diag.issues[1].to_string(), "error [structure] network has no buses");
    }

    #[test]
    fn test_entity_omitted_from_json_when_absent() {
        let mut diag = Diagnostics::new();
        diag.add_error("structure", "no buses");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"error\""));
        assert!(!json.contains("entity"));
    }
}
