use delivcheck_core::{Archive, Deliverable, format_bytes, truncate_preview};
use delivcheck_rules::{
    FileContentMatchRule, FilePresenceRule, FolderStructureRule, MatchType, MaxSizeFileRule, Rule,
    RuleKind,
};
use regex::Regex;
use serde_json::json;

use crate::model::{EvaluateOptions, ValidationResult};
use crate::structure::{build_actual_tree, compare_structures};

const NO_BUFFER_MESSAGE: &str = "No file buffer provided for validation";

/// Archive state handed to the evaluator for one validation call.
pub enum ArchiveInput<'a> {
    /// The caller supplied no archive buffer.
    Missing,
    /// A buffer was supplied but could not be opened.
    Unreadable(String),
    /// An opened archive.
    Open(&'a mut dyn Archive),
}

impl ArchiveInput<'_> {
    fn archive(&mut self) -> Result<&mut dyn Archive, String> {
        match self {
            ArchiveInput::Missing => Err(NO_BUFFER_MESSAGE.to_string()),
            ArchiveInput::Unreadable(err) => Err(format!("Error reading archive: {err}")),
            ArchiveInput::Open(archive) => Ok(&mut **archive),
        }
    }
}

impl std::fmt::Debug for ArchiveInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveInput::Missing => f.write_str("Missing"),
            ArchiveInput::Unreadable(err) => f.debug_tuple("Unreadable").field(err).finish(),
            ArchiveInput::Open(archive) => f
                .debug_struct("Open")
                .field("entries", &archive.entries().len())
                .finish(),
        }
    }
}

/// Evaluates single rules against a deliverable and its archive.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    options: EvaluateOptions,
}

impl RuleEvaluator {
    pub fn new(options: EvaluateOptions) -> Self {
        Self { options }
    }

    /// Evaluate one rule. Never fails: any error becomes an invalid result.
    pub fn evaluate(
        &self,
        rule: &Rule,
        archive: &mut ArchiveInput<'_>,
        deliverable: &Deliverable,
    ) -> ValidationResult {
        let outcome = match &rule.kind {
            RuleKind::MaxSizeFile(payload) => Ok(self.max_size(rule, payload, deliverable)),
            RuleKind::FilePresence(payload) => self.file_presence(rule, payload, archive),
            RuleKind::FileContentMatch(payload) => self.content_match(rule, payload, archive),
            RuleKind::FolderStructure(payload) => self.folder_structure(rule, payload, archive),
        };

        match outcome {
            Ok(result) => result,
            Err(err) => ValidationResult::failed(rule, format!("Validation error: {err}")),
        }
    }

    fn max_size(
        &self,
        rule: &Rule,
        payload: &MaxSizeFileRule,
        deliverable: &Deliverable,
    ) -> ValidationResult {
        if payload.max_size == 0 {
            return ValidationResult::failed(rule, "Max size rule data not found");
        }

        let actual = deliverable.recorded_size();
        let max = payload.max_size;
        let is_valid = actual <= max;
        let message = if is_valid {
            format!("File size {} is within limit", format_bytes(actual))
        } else {
            format!(
                "File size {} exceeds maximum of {}",
                format_bytes(actual),
                format_bytes(max)
            )
        };

        ValidationResult::new(rule, is_valid, message).with_details(json!({
            "actual_size": actual,
            "max_size": max,
            "actual_size_formatted": format_bytes(actual),
            "max_size_formatted": format_bytes(max),
        }))
    }

    fn file_presence(
        &self,
        rule: &Rule,
        payload: &FilePresenceRule,
        archive: &mut ArchiveInput<'_>,
    ) -> delivcheck_core::Result<ValidationResult> {
        if payload.file_name.is_empty() {
            return Ok(ValidationResult::failed(rule, "File presence rule data not found"));
        }
        let archive = match archive.archive() {
            Ok(archive) => archive,
            Err(message) => return Ok(ValidationResult::failed(rule, message)),
        };

        let required = payload.file_name.as_str();
        let found = archive
            .entries()
            .iter()
            .any(|entry| {
                entry.path == required || (!entry.is_dir && entry.basename() == required)
            });
        let message = if found {
            format!("Required file '{required}' found in archive")
        } else {
            format!("Required file '{required}' not found in archive")
        };

        Ok(ValidationResult::new(rule, found, message).with_details(json!({
            "required_file": required,
            "found_files": archive.file_paths(),
        })))
    }

    fn content_match(
        &self,
        rule: &Rule,
        payload: &FileContentMatchRule,
        archive: &mut ArchiveInput<'_>,
    ) -> delivcheck_core::Result<ValidationResult> {
        let archive = match archive.archive() {
            Ok(archive) => archive,
            Err(message) => return Ok(ValidationResult::failed(rule, message)),
        };

        let file_name = payload.file_name.as_str();
        let Some(content) = archive.read_text(file_name)? else {
            return Ok(ValidationResult::failed(
                rule,
                format!("File '{file_name}' not found in archive"),
            )
            .with_details(json!({ "file_name": file_name })));
        };

        let pattern = payload.pattern.as_str();
        let (is_valid, message) = match payload.match_type {
            MatchType::Contains => {
                if content.contains(pattern) {
                    (true, format!("File '{file_name}' contains the expected text"))
                } else {
                    (
                        false,
                        format!("File '{file_name}' does not contain the expected text '{pattern}'"),
                    )
                }
            }
            MatchType::Regex => match Regex::new(pattern) {
                Ok(regex) if regex.is_match(&content) => {
                    (true, format!("File '{file_name}' matches pattern '{pattern}'"))
                }
                Ok(_) => (
                    false,
                    format!("File '{file_name}' does not match pattern '{pattern}'"),
                ),
                Err(err) => (false, format!("Invalid regex pattern '{pattern}': {err}")),
            },
            MatchType::Exact => {
                if content.trim() == pattern {
                    (true, format!("File '{file_name}' content matches exactly"))
                } else {
                    (
                        false,
                        format!("File '{file_name}' content does not exactly match the expected content"),
                    )
                }
            }
        };

        Ok(ValidationResult::new(rule, is_valid, message).with_details(json!({
            "file_name": file_name,
            "pattern": pattern,
            "match_type": payload.match_type.as_str(),
            "content_preview": truncate_preview(&content, self.options.preview_chars),
        })))
    }

    fn folder_structure(
        &self,
        rule: &Rule,
        payload: &FolderStructureRule,
        archive: &mut ArchiveInput<'_>,
    ) -> delivcheck_core::Result<ValidationResult> {
        let archive = match archive.archive() {
            Ok(archive) => archive,
            Err(message) => return Ok(ValidationResult::failed(rule, message)),
        };

        let expected = match payload.expected_structure.parse() {
            Ok(expected) => expected,
            Err(err) => {
                return Ok(
                    ValidationResult::failed(rule, "Invalid expected structure JSON format")
                        .with_details(json!({ "error": err.to_string() })),
                );
            }
        };

        let actual = build_actual_tree(archive.entries());
        let diff = compare_structures(&expected, &actual);
        let message = if diff.is_satisfied() {
            "Folder structure matches expected structure".to_string()
        } else {
            format!("Missing required paths: {}", diff.missing_paths.join(", "))
        };

        Ok(
            ValidationResult::new(rule, diff.is_satisfied(), message).with_details(json!({
                "missing_paths": diff.missing_paths,
                "extra_paths": diff.extra_paths,
                "expected_structure": expected.to_value(),
                "actual_structure": actual.to_value(),
            })),
        )
    }
}
