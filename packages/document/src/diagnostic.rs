//! Structured validation findings.
//!
//! Every issue carries a stable code, the offending operation (when one can
//! be blamed), the offending id, and an optional suggested fix, so that an
//! automated repair loop can act on it without parsing prose.

use crate::patch::Patch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
}

/// Stable issue codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    MissingNode,
    MissingParent,
    MissingChild,
    MissingFrame,
    MissingComponent,
    DuplicateId,
    DuplicateAttach,
    MultiParent,
    Cycle,
    DanglingFrameRoot,
    DanglingComponentRoot,
    DeleteAttached,
    NotAttached,
    InvalidPath,
    MissingComponentReference,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::MissingNode => "MISSING_NODE",
            IssueCode::MissingParent => "MISSING_PARENT",
            IssueCode::MissingChild => "MISSING_CHILD",
            IssueCode::MissingFrame => "MISSING_FRAME",
            IssueCode::MissingComponent => "MISSING_COMPONENT",
            IssueCode::DuplicateId => "DUPLICATE_ID",
            IssueCode::DuplicateAttach => "DUPLICATE_ATTACH",
            IssueCode::MultiParent => "MULTI_PARENT",
            IssueCode::Cycle => "CYCLE",
            IssueCode::DanglingFrameRoot => "DANGLING_FRAME_ROOT",
            IssueCode::DanglingComponentRoot => "DANGLING_COMPONENT_ROOT",
            IssueCode::DeleteAttached => "DELETE_ATTACHED",
            IssueCode::NotAttached => "NOT_ATTACHED",
            IssueCode::InvalidPath => "INVALID_PATH",
            IssueCode::MissingComponentReference => "MISSING_COMPONENT_REFERENCE",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub code: IssueCode,

    pub severity: Severity,

    /// Index of the offending patch in the batch; absent for whole-document checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_index: Option<usize>,

    /// Variant name of the offending patch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,

    pub message: String,

    /// Suggested fix, phrased as an instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            op_index: None,
            op_kind: None,
            target_id: None,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    /// Blames the patch at `index`
    pub fn at_op(mut self, index: usize, patch: &Patch) -> Self {
        self.op_index = Some(index);
        self.op_kind = Some(patch.kind().to_string());
        self
    }

    pub fn with_target(mut self, id: impl ToString) -> Self {
        self.target_id = Some(id.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code)?;
        if let (Some(index), Some(kind)) = (self.op_index, &self.op_kind) {
            write!(f, " op #{} ({})", index, kind)?;
        }
        if let Some(target) = &self.target_id {
            write!(f, " `{}`", target)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " Fix: {}", suggestion)?;
        }
        Ok(())
    }
}

/// All findings for one candidate batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// True when nothing blocks acceptance; warnings are allowed
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| !issue.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }

    /// Renders the blocking issues as a numbered list suitable for feeding
    /// back to whatever produced the batch.
    pub fn repair_prompt(&self) -> String {
        let mut out = String::from("The patch batch was rejected. Fix these problems and resend the whole batch:\n");
        for (i, issue) in self.errors().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, issue));
        }
        out
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s), {} warning(s)", self.error_count(), self.warning_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use designer_common::NodeId;

    #[test]
    fn test_issue_serializes_with_stable_code() {
        let patch = Patch::DeleteNode {
            node_id: NodeId::new("a"),
        };
        let issue = ValidationIssue::error(IssueCode::DeleteAttached, "node is still attached")
            .at_op(3, &patch)
            .with_target("a")
            .with_suggestion("Detach `a` before deleting it");

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "DELETE_ATTACHED");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["opIndex"], 3);
        assert_eq!(json["opKind"], "DeleteNode");
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let mut report = ValidationReport::new();
        report.push(ValidationIssue::warning(IssueCode::MissingComponentReference, "dangling"));
        assert!(report.is_valid());

        report.push(ValidationIssue::error(IssueCode::Cycle, "loop").with_target("x"));
        assert!(!report.is_valid());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_repair_prompt_numbers_errors_only() {
        let mut report = ValidationReport::new();
        report.push(ValidationIssue::warning(IssueCode::MissingComponentReference, "dangling"));
        report.push(ValidationIssue::error(IssueCode::MissingNode, "node `q` does not exist").with_target("q"));
        report.push(ValidationIssue::error(IssueCode::Cycle, "loop"));

        let prompt = report.repair_prompt();
        assert!(prompt.contains("1. [MISSING_NODE] `q`: node `q` does not exist"));
        assert!(prompt.contains("2. [CYCLE]: loop"));
        assert!(!prompt.contains("dangling"));
    }
}
