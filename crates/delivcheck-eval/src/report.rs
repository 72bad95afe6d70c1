use delivcheck_core::Deliverable;

use crate::model::DeliverableValidationReport;
use crate::submission::SubmissionDecision;

/// Render a deterministic markdown report for one validation run.
pub fn render_report(
    deliverable: &Deliverable,
    report: &DeliverableValidationReport,
    decision: Option<&SubmissionDecision>,
) -> String {
    let mut lines = Vec::new();

    lines.push("# Deliverable Validation Report".to_string());
    lines.push(String::new());
    lines.push("## Summary".to_string());
    lines.push(format!("- deliverable_id: {}", deliverable.id));
    lines.push(format!("- project_id: {}", deliverable.project_id));
    lines.push(format!(
        "- status: {}",
        if report.is_valid { "valid" } else { "invalid" }
    ));
    lines.push(format!("- total_rules: {}", report.summary.total_rules));
    lines.push(format!("- passed_rules: {}", report.summary.passed_rules));
    lines.push(format!("- failed_rules: {}", report.summary.failed_rules));
    lines.push(String::new());

    lines.push("## Results".to_string());
    if report.results.is_empty() {
        lines.push("- no rules are assigned to this project.".to_string());
    } else {
        lines.push("| # | rule | type | result | message |".to_string());
        lines.push("| --- | --- | --- | --- | --- |".to_string());
        for (idx, result) in report.results.iter().enumerate() {
            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                idx + 1,
                result.rule_id,
                result.rule_type,
                if result.is_valid { "pass" } else { "fail" },
                escape_cell(&result.message)
            ));
        }
    }
    lines.push(String::new());

    if let Some(decision) = decision {
        lines.push("## Submission".to_string());
        lines.push(format!(
            "- accepted: {}",
            if decision.accepted { "yes" } else { "no" }
        ));
        lines.push(format!(
            "- submitted_in_time: {}",
            if decision.submitted_in_time { "yes" } else { "no" }
        ));
        for reason in &decision.reasons {
            lines.push(format!("- reason: {reason}"));
        }
        lines.push(String::new());
    }

    lines.push("## Recommendations".to_string());
    lines.extend(recommendations(report));
    lines.join("\n")
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

fn recommendations(report: &DeliverableValidationReport) -> Vec<String> {
    let mut lines = Vec::new();
    for result in report.failures() {
        let hint = if result.message.starts_with("No file buffer") {
            "attach the deliverable archive and validate again."
        } else if result.message.starts_with("Error reading archive") {
            "re-export the deliverable as a standard zip archive."
        } else if result.message.starts_with("Invalid regex pattern")
            || result.message.starts_with("Invalid expected structure")
            || result.message.ends_with("rule data not found")
        {
            "fix the rule definition in the catalog."
        } else {
            "update the deliverable and resubmit."
        };
        lines.push(format!("- {}: {hint}", result.rule_id));
    }
    if lines.is_empty() {
        lines.push("- all rules passed; no action required.".to_string());
    }
    lines
}
