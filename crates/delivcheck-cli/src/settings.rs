use std::path::{Path, PathBuf};

use delivcheck_eval::{DEFAULT_PREVIEW_CHARS, SubmissionPolicy};
use delivcheck_rules::write_bytes_atomic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "delivcheck.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("settings file already exists: {0}")]
    AlreadyExists(PathBuf),
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// `delivcheck.toml` contents. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliSettings {
    pub run_dir: PathBuf,
    pub preview_chars: usize,
    pub strict: bool,
    pub allow_late_submission: bool,
    pub block_on_validation_failure: bool,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            run_dir: PathBuf::from("runs"),
            preview_chars: DEFAULT_PREVIEW_CHARS,
            strict: false,
            allow_late_submission: true,
            block_on_validation_failure: false,
        }
    }
}

impl CliSettings {
    /// Submission policy for a project, tightened by the global settings.
    pub fn submission_policy(&self, project: Option<&SubmissionPolicy>) -> SubmissionPolicy {
        let project = project.copied().unwrap_or_default();
        SubmissionPolicy {
            allow_late_submission: project.allow_late_submission && self.allow_late_submission,
            block_on_validation_failure: project.block_on_validation_failure
                || self.block_on_validation_failure,
        }
    }
}

/// Load settings from `path`, falling back to defaults when it does not exist.
pub fn load_settings(path: &Path) -> SettingsResult<CliSettings> {
    if !path.exists() {
        return Ok(CliSettings::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Write `settings` to `path`; an existing file is kept unless `force` is set.
pub fn save_settings(path: &Path, settings: &CliSettings, force: bool) -> SettingsResult<()> {
    if path.exists() && !force {
        return Err(SettingsError::AlreadyExists(path.to_path_buf()));
    }
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(path, encoded.as_bytes())?;
    Ok(())
}
