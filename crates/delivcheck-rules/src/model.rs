use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::structure::{FolderTree, StructureError};

/// A validation check attached to one or more projects.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    /// Stable identifier, unique within a catalog.
    pub id: String,
    /// Kind-specific payload, tagged by `type`.
    #[serde(flatten)]
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(id: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn rule_type(&self) -> RuleType {
        self.kind.rule_type()
    }
}

/// Rule union; exactly one payload per rule.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Upper bound on the recorded archive size.
    MaxSizeFile(MaxSizeFileRule),
    /// A file that must exist somewhere in the archive.
    FilePresence(FilePresenceRule),
    /// Content expectation for a specific archive entry.
    FileContentMatch(FileContentMatchRule),
    /// Folders and files the archive must contain.
    FolderStructure(FolderStructureRule),
}

impl RuleKind {
    pub fn rule_type(&self) -> RuleType {
        match self {
            RuleKind::MaxSizeFile(_) => RuleType::MaxSizeFile,
            RuleKind::FilePresence(_) => RuleType::FilePresence,
            RuleKind::FileContentMatch(_) => RuleType::FileContentMatch,
            RuleKind::FolderStructure(_) => RuleType::FolderStructure,
        }
    }
}

/// Tag of a rule, as reported in validation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    MaxSizeFile,
    FilePresence,
    FileContentMatch,
    FolderStructure,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::MaxSizeFile => "MAX_SIZE_FILE",
            RuleType::FilePresence => "FILE_PRESENCE",
            RuleType::FileContentMatch => "FILE_CONTENT_MATCH",
            RuleType::FolderStructure => "FOLDER_STRUCTURE",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum archive size rule.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MaxSizeFileRule {
    /// Size limit in bytes; must be positive.
    pub max_size: u64,
}

/// Required file rule.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FilePresenceRule {
    /// Archive-relative path or bare file name.
    pub file_name: String,
}

/// File content rule.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileContentMatchRule {
    /// Exact archive-relative path of the entry to inspect.
    pub file_name: String,
    /// Text, regular expression or exact content, depending on `match_type`.
    pub pattern: String,
    pub match_type: MatchType,
}

/// How a content rule compares the entry against its pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Substring test.
    Contains,
    /// Regular expression search over the whole content.
    Regex,
    /// Trimmed content equals the pattern.
    Exact,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Contains => "contains",
            MatchType::Regex => "regex",
            MatchType::Exact => "exact",
        }
    }
}

/// Folder structure rule.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FolderStructureRule {
    /// Expected tree, stored either serialized or inline.
    pub expected_structure: StructureSource,
}

/// Stored form of an expected folder structure.
///
/// The document is only parsed when a rule is evaluated or linted, so a
/// malformed structure never prevents a catalog from loading.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StructureSource {
    /// JSON text, as persisted by the rule editor.
    Serialized(String),
    /// JSON value embedded directly in the catalog.
    Inline(serde_json::Value),
}

impl StructureSource {
    /// Parse the stored document into a tree.
    pub fn parse(&self) -> Result<FolderTree, StructureError> {
        match self {
            StructureSource::Serialized(text) => {
                let value: serde_json::Value = serde_json::from_str(text)
                    .map_err(|err| StructureError::Json(err.to_string()))?;
                FolderTree::from_value(&value)
            }
            StructureSource::Inline(value) => FolderTree::from_value(value),
        }
    }
}

impl From<FolderTree> for StructureSource {
    fn from(tree: FolderTree) -> Self {
        StructureSource::Inline(tree.to_value())
    }
}
