use delivcheck_rules::RuleError;
use thiserror::Error;

/// Errors that abort a whole validation call.
///
/// Per-rule failures never surface here; they are reported as invalid
/// results inside the validation report.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("deliverable '{0}' not found")]
    DeliverableNotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("validation failed with {0} failing rule(s)")]
    Strict(usize),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RuleError> for EvalError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::DeliverableNotFound(id) => EvalError::DeliverableNotFound(id),
            RuleError::Io(err) => EvalError::Io(err),
            RuleError::Json(err) => EvalError::Json(err),
            other => EvalError::BadRequest(other.to_string()),
        }
    }
}
