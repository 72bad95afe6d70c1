mod registry;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use delivcheck_eval::{
    EvalError, EvaluateOptions, SubmissionPolicy, ValidationEngine, check_submission,
    render_report,
};
use delivcheck_rules::{
    RuleError, ValidationIssue, ValidationReport, catalog_json_schema_value,
    load_catalog_document, validate_catalog_document, write_json_document,
};
use registry::{ArchiveInfo, RunContext, init_run_logging, start_run};
use serde_json::Value;
use settings::{CliSettings, DEFAULT_SETTINGS_PATH, load_settings, save_settings};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("settings error: {0}")]
    Settings(#[from] settings::SettingsError),
    #[error("rule error: {0}")]
    Rules(#[from] RuleError),
    #[error("{0}")]
    Eval(#[from] EvalError),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog has {0} error(s)")]
    InvalidCatalog(usize),
}

#[derive(Parser, Debug)]
#[command(name = "delivcheck", version, about = "Validate deliverable archives against project rules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate one deliverable archive and record the run.
    Validate(ValidateArgs),
    /// Lint a rule catalog.
    Check(CheckArgs),
    /// Print the catalog JSON Schema.
    Schema(SchemaArgs),
    /// Write a default settings file.
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Path to the deliverable zip archive; omit to validate without a buffer.
    #[arg(value_name = "ARCHIVE")]
    archive: Option<PathBuf>,
    /// Rule catalog JSON file.
    #[arg(long)]
    catalog: PathBuf,
    /// Deliverable id inside the catalog.
    #[arg(long)]
    deliverable: String,
    /// Output directory for runs (overrides settings).
    #[arg(long)]
    run_dir: Option<PathBuf>,
    /// Settings file.
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
    config: PathBuf,
    /// Exit with an error when any rule fails.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Output format for the printed report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Rule catalog JSON file.
    #[arg(long)]
    catalog: PathBuf,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Write the schema to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Settings file to create.
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
    config: PathBuf,
    /// Overwrite an existing file.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Check(args) => run_check(args),
        Command::Schema(args) => run_schema(args),
        Command::Init(args) => run_init(args),
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let settings = load_settings(&args.config)?;
    let strict = args.strict || settings.strict;
    let run_dir = args.run_dir.clone().unwrap_or_else(|| settings.run_dir.clone());

    let catalog_json = read_json(&args.catalog)?;
    let validated = load_catalog_document(&catalog_json, &catalog_json_schema_value()?)
        .map_err(|report| {
            print_issues(&report);
            CliError::InvalidCatalog(report.errors.len())
        })?;
    let catalog = validated.catalog;

    let archive = match &args.archive {
        Some(path) => Some(std::fs::read(path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?),
        None => None,
    };

    let deliverable = catalog
        .deliverable(&args.deliverable)
        .cloned()
        .ok_or_else(|| EvalError::DeliverableNotFound(args.deliverable.clone()))?;
    let project_policy = catalog
        .project(&deliverable.project_id)
        .map(SubmissionPolicy::from);
    let policy = settings.submission_policy(project_policy.as_ref());

    let ctx = RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: chrono::Utc::now(),
        catalog_version: catalog.catalog_version.clone(),
        catalog_path: args.catalog.clone(),
        deliverable_id: args.deliverable.clone(),
        archive: args
            .archive
            .as_deref()
            .zip(archive.as_deref())
            .map(|(path, data)| ArchiveInfo::from_bytes(path, data)),
        strict,
        preview_chars: settings.preview_chars,
        policy,
        run_dir,
    };

    let mut run = start_run(&ctx)?;
    let _run_span = init_run_logging(&run.paths.logs_path, &ctx)?;

    tracing::info!(
        event = "run_started",
        run_dir = %run.paths.root.display(),
        catalog = %args.catalog.display(),
    );
    for warning in &validated.warnings {
        tracing::warn!(
            event = "catalog_warning",
            code = %warning.code,
            path = %warning.path,
            message = %warning.message,
        );
    }

    let timer = Instant::now();
    let options = EvaluateOptions {
        preview_chars: settings.preview_chars,
    };
    let engine = ValidationEngine::new(&catalog, options);
    let report = engine.validate(&args.deliverable, archive.as_deref())?;

    let decision = check_submission(&deliverable, &report, &policy, chrono::Utc::now());
    tracing::info!(
        event = "submission_checked",
        accepted = decision.accepted,
        submitted_in_time = decision.submitted_in_time,
        reasons = %decision.reasons.join("; "),
    );

    run.write_report(&deliverable, &report, Some(&decision))?;
    run.record_submission(&decision)?;
    tracing::info!(event = "report_written", path = %run.paths.report_json_path.display());

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Markdown => {
            println!("{}", render_report(&deliverable, &report, Some(&decision)))
        }
    }

    let duration_ms = timer.elapsed().as_millis() as u64;
    if strict && !report.is_valid {
        tracing::info!(event = "run_finished", status = "failed", duration_ms = duration_ms);
        return Err(EvalError::Strict(report.summary.failed_rules).into());
    }

    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let catalog_json = read_json(&args.catalog)?;
    match validate_catalog_document(&catalog_json, &catalog_json_schema_value()?) {
        Ok(validated) => {
            let report = ValidationReport {
                errors: Vec::new(),
                warnings: validated.warnings,
            };
            print_issues(&report);
            println!(
                "catalog ok: {} rule(s), {} project(s), {} deliverable(s)",
                validated.catalog.rules.len(),
                validated.catalog.projects.len(),
                validated.catalog.deliverables.len()
            );
            Ok(())
        }
        Err(report) => {
            print_issues(&report);
            Err(CliError::InvalidCatalog(report.errors.len()))
        }
    }
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = catalog_json_schema_value()?;
    match args.out {
        Some(path) => write_json_document(&path, &schema)
            .map_err(|source| CliError::Io { path, source }),
        None => {
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn run_init(args: InitArgs) -> Result<(), CliError> {
    save_settings(&args.config, &CliSettings::default(), args.force)?;
    println!("wrote {}", args.config.display());
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn print_issues(report: &ValidationReport) {
    for issue in &report.errors {
        eprintln!("error {}", format_issue(issue));
    }
    for issue in &report.warnings {
        eprintln!("warning {}", format_issue(issue));
    }
}

fn format_issue(issue: &ValidationIssue) -> String {
    let hint = issue
        .hint
        .as_ref()
        .map(|hint| format!(" (hint: {hint})"))
        .unwrap_or_default();
    format!("[{}] {}: {}{}", issue.code, issue.path, issue.message, hint)
}
