use std::path::Path;

use delivcheck_core::{CATALOG_VERSION, Deliverable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, RuleError};
use crate::model::{Rule, RuleKind};
use crate::persist::write_json_document;
use crate::source::{DeliverableRules, RuleSource};
use crate::validate::rule_issues;

/// A project that rules can be attached to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Accept deliverables submitted after their deadline.
    #[serde(default = "default_true")]
    pub allow_late_submission: bool,
    /// Reject deliverables whose validation report has failures.
    #[serde(default)]
    pub block_on_validation_failure: bool,
}

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            allow_late_submission: true,
            block_on_validation_failure: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Attachment of a rule to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleAssignment {
    pub rule_id: String,
    pub project_id: String,
}

/// Rules, projects, deliverables and their assignments.
///
/// The catalog is the file-backed rule source used by the CLI; assignment
/// order defines the order in which a project's rules are evaluated.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RuleCatalog {
    /// Contract version for the catalog format.
    pub catalog_version: String,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
    #[serde(default)]
    pub assignments: Vec<RuleAssignment>,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self {
            catalog_version: CATALOG_VERSION.to_string(),
            projects: Vec::new(),
            rules: Vec::new(),
            deliverables: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the catalog as pretty JSON, replacing any previous file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_document(path, self)?;
        Ok(())
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn deliverable(&self, id: &str) -> Option<&Deliverable> {
        self.deliverables
            .iter()
            .find(|deliverable| deliverable.id == id)
    }

    /// Add a new rule after checking its payload.
    pub fn create_rule(&mut self, rule: Rule) -> Result<&Rule> {
        if self.rule(&rule.id).is_some() {
            return Err(RuleError::DuplicateRule(rule.id));
        }
        ensure_valid(&rule)?;
        self.rules.push(rule);
        Ok(&self.rules[self.rules.len() - 1])
    }

    /// Replace the payload of an existing rule; the rule type cannot change.
    pub fn update_rule(&mut self, id: &str, kind: RuleKind) -> Result<&Rule> {
        let idx = self
            .rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))?;

        let existing = self.rules[idx].rule_type();
        let requested = kind.rule_type();
        if existing != requested {
            return Err(RuleError::RuleTypeMismatch {
                rule_id: id.to_string(),
                existing,
                requested,
            });
        }

        let updated = Rule::new(id, kind);
        ensure_valid(&updated)?;
        self.rules[idx] = updated;
        Ok(&self.rules[idx])
    }

    /// Delete a rule and every assignment that references it.
    pub fn remove_rule(&mut self, id: &str) -> Result<Rule> {
        let idx = self
            .rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))?;
        self.assignments.retain(|assignment| assignment.rule_id != id);
        Ok(self.rules.remove(idx))
    }

    pub fn add_project(&mut self, project: Project) -> Result<()> {
        if self.project(&project.id).is_some() {
            return Err(RuleError::DuplicateProject(project.id));
        }
        self.projects.push(project);
        Ok(())
    }

    pub fn add_deliverable(&mut self, deliverable: Deliverable) -> Result<()> {
        if self.deliverable(&deliverable.id).is_some() {
            return Err(RuleError::DuplicateDeliverable(deliverable.id));
        }
        if self.project(&deliverable.project_id).is_none() {
            return Err(RuleError::ProjectNotFound(deliverable.project_id));
        }
        self.deliverables.push(deliverable);
        Ok(())
    }

    /// Attach a rule to a project; each pair may only be assigned once.
    pub fn assign_rule(&mut self, rule_id: &str, project_id: &str) -> Result<()> {
        if self.rule(rule_id).is_none() {
            return Err(RuleError::RuleNotFound(rule_id.to_string()));
        }
        if self.project(project_id).is_none() {
            return Err(RuleError::ProjectNotFound(project_id.to_string()));
        }
        if self.is_assigned(rule_id, project_id) {
            return Err(RuleError::DuplicateAssignment {
                rule_id: rule_id.to_string(),
                project_id: project_id.to_string(),
            });
        }
        self.assignments.push(RuleAssignment {
            rule_id: rule_id.to_string(),
            project_id: project_id.to_string(),
        });
        Ok(())
    }

    pub fn unassign_rule(&mut self, rule_id: &str, project_id: &str) -> Result<()> {
        let before = self.assignments.len();
        self.assignments.retain(|assignment| {
            !(assignment.rule_id == rule_id && assignment.project_id == project_id)
        });
        if self.assignments.len() == before {
            return Err(RuleError::AssignmentNotFound {
                rule_id: rule_id.to_string(),
                project_id: project_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn is_assigned(&self, rule_id: &str, project_id: &str) -> bool {
        self.assignments
            .iter()
            .any(|assignment| assignment.rule_id == rule_id && assignment.project_id == project_id)
    }

    /// Rules attached to a project, in assignment order.
    pub fn rules_for_project(&self, project_id: &str) -> Result<Vec<Rule>> {
        self.assignments
            .iter()
            .filter(|assignment| assignment.project_id == project_id)
            .map(|assignment| {
                self.rule(&assignment.rule_id)
                    .cloned()
                    .ok_or_else(|| RuleError::RuleNotFound(assignment.rule_id.clone()))
            })
            .collect()
    }
}

impl RuleSource for RuleCatalog {
    fn deliverable_rules(&self, deliverable_id: &str) -> Result<DeliverableRules> {
        let deliverable = self
            .deliverable(deliverable_id)
            .cloned()
            .ok_or_else(|| RuleError::DeliverableNotFound(deliverable_id.to_string()))?;
        if self.project(&deliverable.project_id).is_none() {
            return Err(RuleError::ProjectNotFound(deliverable.project_id));
        }
        let rules = self.rules_for_project(&deliverable.project_id)?;
        Ok(DeliverableRules { deliverable, rules })
    }
}

fn ensure_valid(rule: &Rule) -> Result<()> {
    let report = rule_issues(rule, &format!("/rules/{}", rule.id));
    if report.is_ok() {
        return Ok(());
    }
    let messages: Vec<String> = report
        .errors
        .iter()
        .map(|issue| issue.message.clone())
        .collect();
    Err(RuleError::InvalidRule(messages.join("; ")))
}
