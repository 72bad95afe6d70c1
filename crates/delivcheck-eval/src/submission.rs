use chrono::{DateTime, Utc};
use delivcheck_core::Deliverable;
use delivcheck_rules::Project;
use serde::{Deserialize, Serialize};

use crate::model::DeliverableValidationReport;

pub const LATE_SUBMISSION_REJECTED: &str = "Late submission not allowed for this project";

/// Acceptance policy applied when a deliverable is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPolicy {
    pub allow_late_submission: bool,
    pub block_on_validation_failure: bool,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            allow_late_submission: true,
            block_on_validation_failure: false,
        }
    }
}

impl From<&Project> for SubmissionPolicy {
    fn from(project: &Project) -> Self {
        Self {
            allow_late_submission: project.allow_late_submission,
            block_on_validation_failure: project.block_on_validation_failure,
        }
    }
}

/// Outcome of the submission policy for one deliverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDecision {
    pub accepted: bool,
    pub submitted_in_time: bool,
    /// Why the submission was rejected, or which failures were let through.
    pub reasons: Vec<String>,
}

/// Decide whether a validated deliverable is accepted at `now`.
pub fn check_submission(
    deliverable: &Deliverable,
    report: &DeliverableValidationReport,
    policy: &SubmissionPolicy,
    now: DateTime<Utc>,
) -> SubmissionDecision {
    let submitted_in_time = deliverable.is_submitted_in_time(now);
    let mut accepted = true;
    let mut reasons = Vec::new();

    if !submitted_in_time && !policy.allow_late_submission {
        accepted = false;
        reasons.push(LATE_SUBMISSION_REJECTED.to_string());
    }

    if !report.is_valid {
        let failed: Vec<String> = report
            .failures()
            .map(|result| result.rule_type.to_string())
            .collect();
        if policy.block_on_validation_failure {
            accepted = false;
            reasons.push(format!("Validation failed: {}", failed.join(", ")));
        } else {
            tracing::warn!(
                event = "validation_failures_ignored",
                deliverable_id = %deliverable.id,
                failed_rules = %failed.join(", "),
            );
            reasons.push(format!(
                "Accepted with validation failures: {}",
                failed.join(", ")
            ));
        }
    }

    SubmissionDecision {
        accepted,
        submitted_in_time,
        reasons,
    }
}
