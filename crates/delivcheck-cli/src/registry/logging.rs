use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing::span::EnteredSpan;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

use super::{RegistryError, RegistryResult, RunContext};

const DEFAULT_FILTER: &str = "info";

/// Route `tracing` events into the run's `logs.ndjson`.
///
/// Every line carries the `run` span with the run and deliverable ids for as
/// long as the returned guard is held.
pub fn init_run_logging(path: &Path, ctx: &RunContext) -> RegistryResult<EnteredSpan> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(Arc::new(file));

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| RegistryError::Logging(err.to_string()))?;

    let span = tracing::info_span!(
        "run",
        run_id = %ctx.run_id,
        deliverable_id = %ctx.deliverable_id,
    );
    Ok(span.entered())
}
