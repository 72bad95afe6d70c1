use delivcheck_core::Deliverable;

use crate::errors::Result;
use crate::model::Rule;

/// A deliverable together with the ordered rules of its project.
#[derive(Debug, Clone)]
pub struct DeliverableRules {
    pub deliverable: Deliverable,
    pub rules: Vec<Rule>,
}

/// Resolves the rules that apply to a deliverable.
///
/// Implementations return `RuleError::DeliverableNotFound` for unknown ids and
/// must preserve the rule order of the underlying data source.
pub trait RuleSource {
    fn deliverable_rules(&self, deliverable_id: &str) -> Result<DeliverableRules>;
}

impl<T: RuleSource + ?Sized> RuleSource for &T {
    fn deliverable_rules(&self, deliverable_id: &str) -> Result<DeliverableRules> {
        (**self).deliverable_rules(deliverable_id)
    }
}
