use serde::Serialize;
use thiserror::Error;

use crate::model::RuleType;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }

    /// Error-severity issue at a catalog path.
    pub fn error(
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<&str>,
    ) -> Self {
        Self::new(
            IssueSeverity::Error,
            code,
            path,
            message,
            hint.map(str::to_string),
        )
    }

    /// Warning-severity issue at a catalog path.
    pub fn warning(
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<&str>,
    ) -> Self {
        Self::new(
            IssueSeverity::Warning,
            code,
            path,
            message,
            hint.map(str::to_string),
        )
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Route an issue to errors or warnings according to its severity.
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity {
            IssueSeverity::Error => self.errors.push(issue),
            IssueSeverity::Warning => self.warnings.push(issue),
        }
    }

    /// Issues with the given code, errors first.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(move |issue| issue.code == code)
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Catalog and rule errors that are not lint issues.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("rule '{0}' not found")]
    RuleNotFound(String),
    #[error("deliverable '{0}' not found")]
    DeliverableNotFound(String),
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("rule '{0}' already exists")]
    DuplicateRule(String),
    #[error("project '{0}' already exists")]
    DuplicateProject(String),
    #[error("deliverable '{0}' already exists")]
    DuplicateDeliverable(String),
    #[error("rule '{rule_id}' is already assigned to project '{project_id}'")]
    DuplicateAssignment { rule_id: String, project_id: String },
    #[error("rule '{rule_id}' is not assigned to project '{project_id}'")]
    AssignmentNotFound { rule_id: String, project_id: String },
    #[error("rule '{rule_id}' is {existing}; cannot update it with a {requested} payload")]
    RuleTypeMismatch {
        rule_id: String,
        existing: RuleType,
        requested: RuleType,
    },
    #[error("invalid rule: {0}")]
    InvalidRule(String),
}

/// Result type for rule and catalog operations.
pub type Result<T> = std::result::Result<T, RuleError>;
