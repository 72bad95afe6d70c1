use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A student submission unit subject to the rules of its project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Deliverable {
    /// Stable identifier.
    pub id: String,
    /// Project whose rules apply to this deliverable.
    pub project_id: String,
    /// Recorded archive size in bytes, as stored at upload time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_size: Option<u64>,
    /// Submission deadline, if the project sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

impl Deliverable {
    pub fn new(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            archive_size: None,
            deadline: None,
        }
    }

    /// Recorded archive size, or zero when no archive metadata exists.
    pub fn recorded_size(&self) -> u64 {
        self.archive_size.unwrap_or(0)
    }

    /// A deliverable without deadline is always on time.
    pub fn is_submitted_in_time(&self, at: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => at <= deadline,
            None => true,
        }
    }
}
