use std::fmt;
use std::str::FromStr;

use opensilicon_core::{ItemId, LayerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rules::ConstraintType;

/// Severity level assigned to a rule and carried by its violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
    /// The rule still resolves, but its violations are not reported.
    Ignore,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            "ignore" => Ok(Severity::Ignore),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Ignore => "ignore",
        })
    }
}

/// A single DRC violation with location and description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrcViolation {
    pub id: Uuid,
    /// Name of the provider that found the violation.
    pub provider: String,
    pub constraint: ConstraintType,
    pub severity: Severity,
    /// Rule whose constraint won resolution.
    pub rule_name: String,
    pub message: String,
    pub layer_id: Option<LayerId>,
    /// Bounding box of the violation region: [min_x, min_y, max_x, max_y]
    pub bbox: [f64; 4],
    /// Identities of the offending items.
    pub items: Vec<ItemId>,
}

impl DrcViolation {
    pub fn new(
        provider: &str,
        constraint: ConstraintType,
        rule_name: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: provider.to_string(),
            constraint,
            severity: Severity::Error,
            rule_name: rule_name.to_string(),
            message: message.into(),
            layer_id: None,
            bbox: [0.0; 4],
            items: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn on_layer(mut self, layer: LayerId) -> Self {
        self.layer_id = Some(layer);
        self
    }

    pub fn at(mut self, bbox: [f64; 4]) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = ItemId>) -> Self {
        self.items.extend(items);
        self
    }
}

impl fmt::Display for DrcViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, rule '{}')",
            self.severity, self.message, self.constraint, self.rule_name
        )
    }
}
