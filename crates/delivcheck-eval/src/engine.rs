use std::time::Instant;

use delivcheck_core::{Deliverable, Error, ZipBundle};
use delivcheck_rules::{Rule, RuleSource};

use crate::errors::EvalError;
use crate::evaluator::{ArchiveInput, RuleEvaluator};
use crate::model::{DeliverableValidationReport, EvaluateOptions};

/// Validate deliverables against the rules of their project.
#[derive(Debug, Clone)]
pub struct ValidationEngine<S> {
    source: S,
    options: EvaluateOptions,
}

impl<S: RuleSource> ValidationEngine<S> {
    pub fn new(source: S, options: EvaluateOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run every rule of the deliverable's project against `archive`.
    ///
    /// Only an unknown deliverable (or a failing rule source) is an error;
    /// every rule-level problem is carried as an invalid result.
    pub fn validate(
        &self,
        deliverable_id: &str,
        archive: Option<&[u8]>,
    ) -> Result<DeliverableValidationReport, EvalError> {
        let resolved = self.source.deliverable_rules(deliverable_id)?;
        Ok(validate_rules(
            &resolved.rules,
            &resolved.deliverable,
            archive,
            &self.options,
        ))
    }
}

/// Evaluate `rules` in order and aggregate the results.
///
/// The archive is opened at most once; when it cannot be opened every rule
/// that needs it reports the read error.
pub fn validate_rules(
    rules: &[Rule],
    deliverable: &Deliverable,
    archive: Option<&[u8]>,
    options: &EvaluateOptions,
) -> DeliverableValidationReport {
    let started = Instant::now();
    tracing::info!(
        event = "validation_started",
        deliverable_id = %deliverable.id,
        project_id = %deliverable.project_id,
        rule_count = rules.len(),
        archive_bytes = archive.map(|bytes| bytes.len()),
    );

    let mut bundle = None;
    let mut open_error = None;
    if let Some(bytes) = archive {
        match ZipBundle::open(bytes) {
            Ok(opened) => bundle = Some(opened),
            Err(err) => {
                tracing::warn!(
                    event = "archive_unreadable",
                    deliverable_id = %deliverable.id,
                    error = %err,
                );
                open_error = Some(match err {
                    Error::Archive(message) => message,
                    other => other.to_string(),
                });
            }
        }
    }
    let mut input = match (bundle.as_mut(), open_error) {
        (Some(bundle), _) => ArchiveInput::Open(bundle),
        (None, Some(err)) => ArchiveInput::Unreadable(err),
        (None, None) => ArchiveInput::Missing,
    };

    let evaluator = RuleEvaluator::new(options.clone());
    let results: Vec<_> = rules
        .iter()
        .map(|rule| {
            let result = evaluator.evaluate(rule, &mut input, deliverable);
            tracing::debug!(
                event = "rule_evaluated",
                rule_id = %result.rule_id,
                rule_type = %result.rule_type,
                is_valid = result.is_valid,
                message = %result.message,
            );
            result
        })
        .collect();

    let report = DeliverableValidationReport::from_results(results);
    tracing::info!(
        event = "validation_finished",
        deliverable_id = %deliverable.id,
        is_valid = report.is_valid,
        total_rules = report.summary.total_rules,
        passed_rules = report.summary.passed_rules,
        failed_rules = report.summary.failed_rules,
        duration_ms = started.elapsed().as_millis() as u64,
    );
    report
}
