//! Rule evaluation and validation reports for deliverables.

pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod model;
pub mod report;
pub mod structure;
pub mod submission;

pub use engine::{ValidationEngine, validate_rules};
pub use errors::EvalError;
pub use evaluator::{ArchiveInput, RuleEvaluator};
pub use model::{
    DEFAULT_PREVIEW_CHARS, DeliverableValidationReport, EvaluateOptions, ValidationResult,
    ValidationSummary,
};
pub use report::render_report;
pub use structure::{StructureDiff, build_actual_tree, compare_structures};
pub use submission::{
    LATE_SUBMISSION_REJECTED, SubmissionDecision, SubmissionPolicy, check_submission,
};
