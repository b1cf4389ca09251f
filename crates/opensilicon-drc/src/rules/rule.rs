use opensilicon_core::{LayerId, LayerStack, Pattern};

use super::constraint::{Constraint, ConstraintType};
use crate::expr::CompiledExpression;
use crate::violation::Severity;

/// A parsed rule: an optional condition gating an ordered list of constraints.
///
/// Rules are never mutated after parsing. `priority` is the rule's position
/// in the document; lower values win resolution.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub enabled: bool,
    pub priority: usize,
    /// `None` means the rule applies unconditionally.
    pub condition: Option<CompiledExpression>,
    /// Optional layer pattern restricting where the rule applies, compiled at parse time.
    pub layer: Option<Pattern>,
    pub severity: Severity,
    pub constraints: Vec<Constraint>,
    /// 1-based line of the `(rule ...)` form.
    pub line: usize,
}

impl Rule {
    pub fn new(name: &str, priority: usize) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            priority,
            condition: None,
            layer: None,
            severity: Severity::default(),
            constraints: Vec::new(),
            line: 0,
        }
    }

    pub fn constraints_of(&self, kind: ConstraintType) -> impl Iterator<Item = (usize, &Constraint)> {
        self.constraints
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.kind == kind)
    }

    /// Whether the rule's layer filter admits `layer`. Rules without a filter admit everything.
    pub fn applies_to_layer(&self, layer: Option<LayerId>, layers: &LayerStack) -> bool {
        match (&self.layer, layer) {
            (None, _) => true,
            (Some(pattern), Some(id)) => layers.layer_matches(id, pattern),
            (Some(_), None) => false,
        }
    }

    pub fn is_unconditional(&self) -> bool {
        self.condition.is_none() && self.layer.is_none()
    }
}
