use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use delivcheck_core::Deliverable;
use delivcheck_eval::{
    DeliverableValidationReport, SubmissionDecision, SubmissionPolicy, render_report,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::{RegistryError, RegistryResult};

/// Archive identity recorded with each run.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

impl ArchiveInfo {
    pub fn from_bytes(path: &Path, data: &[u8]) -> Self {
        Self {
            path: path.to_path_buf(),
            bytes: data.len() as u64,
            sha256: hex::encode(Sha256::digest(data)),
        }
    }
}

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub catalog_version: String,
    pub catalog_path: PathBuf,
    pub deliverable_id: String,
    pub archive: Option<ArchiveInfo>,
    pub strict: bool,
    pub preview_chars: usize,
    pub policy: SubmissionPolicy,
    pub run_dir: PathBuf,
}

/// JSON config written to each run directory.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub catalog_version: String,
    pub catalog_path: PathBuf,
    pub deliverable_id: String,
    pub archive: Option<ArchiveInfo>,
    pub strict: bool,
    pub preview_chars: usize,
    pub policy: SubmissionPolicy,
    pub git: GitInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionDecision>,
}

/// Git metadata for reproducibility.
#[derive(Debug, Clone, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub logs_path: PathBuf,
    pub report_json_path: PathBuf,
    pub report_md_path: PathBuf,
}

/// An open run directory and the config already written into it.
#[derive(Debug)]
pub struct RunHandle {
    pub paths: RunPaths,
    config: RunConfig,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunHandle> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let paths = RunPaths {
        config_path: root.join("config.json"),
        logs_path: root.join("logs.ndjson"),
        report_json_path: root.join("report.json"),
        report_md_path: root.join("report.md"),
        root,
    };

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        catalog_version: ctx.catalog_version.clone(),
        catalog_path: ctx.catalog_path.clone(),
        deliverable_id: ctx.deliverable_id.clone(),
        archive: ctx.archive.clone(),
        strict: ctx.strict,
        preview_chars: ctx.preview_chars,
        policy: ctx.policy,
        git: collect_git_info(),
        submission: None,
    };

    write_json(&paths.config_path, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.logs_path)?;

    Ok(RunHandle { paths, config })
}

impl RunHandle {
    /// Write `report.json` and `report.md`.
    pub fn write_report(
        &self,
        deliverable: &Deliverable,
        report: &DeliverableValidationReport,
        decision: Option<&SubmissionDecision>,
    ) -> RegistryResult<()> {
        write_json(&self.paths.report_json_path, report)?;
        std::fs::write(
            &self.paths.report_md_path,
            render_report(deliverable, report, decision),
        )?;
        Ok(())
    }

    /// Append the submission decision to `config.json`.
    pub fn record_submission(&mut self, decision: &SubmissionDecision) -> RegistryResult<()> {
        self.config.submission = Some(decision.clone());
        write_json(&self.paths.config_path, &self.config)
    }
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
