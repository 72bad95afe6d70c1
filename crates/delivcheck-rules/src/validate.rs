use std::collections::HashSet;

use delivcheck_core::CATALOG_VERSION;
use jsonschema::JSONSchema;
use regex::Regex;
use serde_json::Value;

use crate::catalog::RuleCatalog;
use crate::errors::{IssueSeverity, RuleError, ValidationIssue, ValidationReport};
use crate::model::{
    FileContentMatchRule, FolderStructureRule, MatchType, Rule, RuleKind,
};

/// Catalog that passed validation, with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedCatalog {
    pub catalog: RuleCatalog,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a catalog JSON document against the catalog JSON Schema.
pub fn validate_catalog_json(
    catalog_json: &Value,
    catalog_schema: &Value,
) -> Result<ValidationReport, RuleError> {
    let compiled =
        JSONSchema::compile(catalog_schema).map_err(|err| RuleError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(catalog_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Validate the references and rule payloads of a parsed catalog.
pub fn validate_catalog(catalog: &RuleCatalog) -> ValidationReport {
    let mut report = ValidationReport::default();

    if catalog.catalog_version != CATALOG_VERSION {
        report.push(ValidationIssue::error(
            "catalog_version_mismatch",
            "/catalog_version",
            format!(
                "catalog_version '{}' is not supported (expected '{CATALOG_VERSION}')",
                catalog.catalog_version
            ),
            Some("regenerate the catalog with the current delivcheck version"),
        ));
    }

    let project_ids = unique_ids(
        catalog.projects.iter().map(|project| project.id.as_str()),
        "/projects",
        "duplicate_project_id",
        &mut report,
    );
    let rule_ids = unique_ids(
        catalog.rules.iter().map(|rule| rule.id.as_str()),
        "/rules",
        "duplicate_rule_id",
        &mut report,
    );
    unique_ids(
        catalog
            .deliverables
            .iter()
            .map(|deliverable| deliverable.id.as_str()),
        "/deliverables",
        "duplicate_deliverable_id",
        &mut report,
    );

    for (idx, rule) in catalog.rules.iter().enumerate() {
        report.merge(rule_issues(rule, &format!("/rules/{idx}")));
    }

    for (idx, deliverable) in catalog.deliverables.iter().enumerate() {
        if !project_ids.contains(deliverable.project_id.as_str()) {
            report.push(ValidationIssue::error(
                "deliverable_unknown_project",
                format!("/deliverables/{idx}/project_id"),
                format!(
                    "deliverable '{}' references unknown project '{}'",
                    deliverable.id, deliverable.project_id
                ),
                Some("declare the project under /projects"),
            ));
        }
    }

    validate_assignments(catalog, &project_ids, &rule_ids, &mut report);

    report
}

/// Validate the catalog end-to-end, returning structured issues on failure.
pub fn validate_catalog_document(
    catalog_json: &Value,
    catalog_schema: &Value,
) -> Result<ValidatedCatalog, ValidationReport> {
    let catalog = parse_catalog_document(catalog_json, catalog_schema)?;

    let semantic = validate_catalog(&catalog);
    if !semantic.is_ok() {
        return Err(semantic);
    }

    Ok(ValidatedCatalog {
        catalog,
        warnings: semantic.warnings,
    })
}

/// Load a catalog for evaluation.
///
/// Only schema violations and unparseable documents are fatal. Semantic
/// issues are downgraded to warnings: a bad rule fails on its own when it is
/// evaluated, and dangling references surface through the rule source for
/// the deliverables that hit them.
pub fn load_catalog_document(
    catalog_json: &Value,
    catalog_schema: &Value,
) -> Result<ValidatedCatalog, ValidationReport> {
    let catalog = parse_catalog_document(catalog_json, catalog_schema)?;
    let semantic = validate_catalog(&catalog);

    let warnings = semantic
        .errors
        .into_iter()
        .map(|issue| ValidationIssue {
            severity: IssueSeverity::Warning,
            ..issue
        })
        .chain(semantic.warnings)
        .collect();

    Ok(ValidatedCatalog { catalog, warnings })
}

fn parse_catalog_document(
    catalog_json: &Value,
    catalog_schema: &Value,
) -> Result<RuleCatalog, ValidationReport> {
    let structural = match validate_catalog_json(catalog_json, catalog_schema) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    serde_json::from_value(catalog_json.clone()).map_err(|err| {
        let mut report = ValidationReport::default();
        report.push(ValidationIssue::error(
            "invalid_catalog_json",
            "/",
            err.to_string(),
            None,
        ));
        report
    })
}

/// Check one rule payload; `base_path` locates the rule in the document.
pub fn rule_issues(rule: &Rule, base_path: &str) -> ValidationReport {
    let mut report = ValidationReport::default();

    if rule.id.trim().is_empty() {
        report.push(ValidationIssue::error(
            "rule_id_empty",
            format!("{base_path}/id"),
            "rule id must not be empty",
            None,
        ));
    }

    match &rule.kind {
        RuleKind::MaxSizeFile(payload) => {
            if payload.max_size == 0 {
                report.push(ValidationIssue::error(
                    "max_size_zero",
                    format!("{base_path}/max_size"),
                    "max_size must be greater than zero",
                    Some("set max_size to a positive number of bytes"),
                ));
            }
        }
        RuleKind::FilePresence(payload) => {
            check_file_name(&payload.file_name, base_path, &mut report);
            if payload.file_name.ends_with('/') {
                report.push(ValidationIssue::warning(
                    "file_name_is_directory",
                    format!("{base_path}/file_name"),
                    format!(
                        "'{}' names a directory; presence checks only match files",
                        payload.file_name
                    ),
                    Some("use a folder_structure rule to require directories"),
                ));
            }
        }
        RuleKind::FileContentMatch(payload) => {
            check_content_match(payload, base_path, &mut report);
        }
        RuleKind::FolderStructure(payload) => {
            check_folder_structure(payload, base_path, &mut report);
        }
    }

    report
}

fn check_file_name(file_name: &str, base_path: &str, report: &mut ValidationReport) {
    if file_name.trim().is_empty() {
        report.push(ValidationIssue::error(
            "file_name_empty",
            format!("{base_path}/file_name"),
            "file_name must not be empty",
            Some("set file_name to a path inside the archive"),
        ));
    }
}

fn check_content_match(payload: &FileContentMatchRule, base_path: &str, report: &mut ValidationReport) {
    check_file_name(&payload.file_name, base_path, report);

    if payload.pattern.is_empty() {
        report.push(ValidationIssue::error(
            "pattern_empty",
            format!("{base_path}/pattern"),
            "pattern must not be empty",
            None,
        ));
        return;
    }

    match payload.match_type {
        MatchType::Regex => {
            if let Err(err) = Regex::new(&payload.pattern) {
                report.push(ValidationIssue::error(
                    "regex_invalid",
                    format!("{base_path}/pattern"),
                    format!("invalid regex pattern '{}': {err}", payload.pattern),
                    Some("escape special characters or switch match_type to contains"),
                ));
            }
        }
        MatchType::Exact => {
            if payload.pattern.trim() != payload.pattern {
                report.push(ValidationIssue::warning(
                    "exact_pattern_whitespace",
                    format!("{base_path}/pattern"),
                    "exact patterns are compared against trimmed content and can never match surrounding whitespace",
                    Some("trim the pattern"),
                ));
            }
        }
        MatchType::Contains => {}
    }
}

fn check_folder_structure(payload: &FolderStructureRule, base_path: &str, report: &mut ValidationReport) {
    match payload.expected_structure.parse() {
        Ok(tree) if tree.is_empty() => {
            report.push(ValidationIssue::warning(
                "structure_empty",
                format!("{base_path}/expected_structure"),
                "expected structure is empty; the rule always passes",
                None,
            ));
        }
        Ok(_) => {}
        Err(err) => {
            report.push(ValidationIssue::error(
                "structure_invalid",
                format!("{base_path}/expected_structure"),
                err.to_string(),
                Some("use a mapping of names to \"file\" or nested folders"),
            ));
        }
    }
}

fn validate_assignments(
    catalog: &RuleCatalog,
    project_ids: &HashSet<&str>,
    rule_ids: &HashSet<&str>,
    report: &mut ValidationReport,
) {
    let mut seen = HashSet::new();
    for (idx, assignment) in catalog.assignments.iter().enumerate() {
        let base_path = format!("/assignments/{idx}");
        if !rule_ids.contains(assignment.rule_id.as_str()) {
            report.push(ValidationIssue::error(
                "assignment_unknown_rule",
                format!("{base_path}/rule_id"),
                format!("rule '{}' not found", assignment.rule_id),
                None,
            ));
        }
        if !project_ids.contains(assignment.project_id.as_str()) {
            report.push(ValidationIssue::error(
                "assignment_unknown_project",
                format!("{base_path}/project_id"),
                format!("project '{}' not found", assignment.project_id),
                None,
            ));
        }
        if !seen.insert((assignment.rule_id.as_str(), assignment.project_id.as_str())) {
            report.push(ValidationIssue::error(
                "assignment_duplicate",
                base_path,
                format!(
                    "rule '{}' is assigned to project '{}' more than once",
                    assignment.rule_id, assignment.project_id
                ),
                Some("remove the duplicate assignment"),
            ));
        }
    }

    for (idx, rule) in catalog.rules.iter().enumerate() {
        if !catalog
            .assignments
            .iter()
            .any(|assignment| assignment.rule_id == rule.id)
        {
            report.push(ValidationIssue::warning(
                "rule_unassigned",
                format!("/rules/{idx}"),
                format!("rule '{}' is not assigned to any project", rule.id),
                None,
            ));
        }
    }

    for (idx, project) in catalog.projects.iter().enumerate() {
        if !catalog
            .assignments
            .iter()
            .any(|assignment| assignment.project_id == project.id)
        {
            report.push(ValidationIssue::warning(
                "project_without_rules",
                format!("/projects/{idx}"),
                format!("project '{}' has no rules; every deliverable passes", project.id),
                None,
            ));
        }
    }
}

fn unique_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    collection_path: &str,
    code: &str,
    report: &mut ValidationReport,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for (idx, id) in ids.enumerate() {
        if !seen.insert(id) {
            report.push(ValidationIssue::error(
                code,
                format!("{collection_path}/{idx}/id"),
                format!("id '{id}' is declared more than once"),
                None,
            ));
        }
    }
    seen
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
