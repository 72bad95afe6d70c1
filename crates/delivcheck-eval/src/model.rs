use delivcheck_rules::{Rule, RuleType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of characters kept in content previews.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Options for rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateOptions {
    /// Characters of entry content echoed back in content-match details.
    pub preview_chars: usize,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

/// Outcome of one rule against one deliverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub rule_id: String,
    pub rule_type: RuleType,
    pub is_valid: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ValidationResult {
    pub fn passed(rule: &Rule, message: impl Into<String>) -> Self {
        Self::new(rule, true, message)
    }

    pub fn failed(rule: &Rule, message: impl Into<String>) -> Self {
        Self::new(rule, false, message)
    }

    pub fn new(rule: &Rule, is_valid: bool, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule.id.clone(),
            rule_type: rule.rule_type(),
            is_valid,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Pass/fail counters of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_rules: usize,
    pub passed_rules: usize,
    pub failed_rules: usize,
}

/// Aggregate outcome across every rule of a deliverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverableValidationReport {
    pub is_valid: bool,
    pub results: Vec<ValidationResult>,
    pub summary: ValidationSummary,
}

impl DeliverableValidationReport {
    /// Build the report and its summary from ordered results.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let total_rules = results.len();
        let passed_rules = results.iter().filter(|result| result.is_valid).count();
        let failed_rules = total_rules - passed_rules;
        Self {
            is_valid: failed_rules == 0,
            results,
            summary: ValidationSummary {
                total_rules,
                passed_rules,
                failed_rules,
            },
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|result| !result.is_valid)
    }
}
