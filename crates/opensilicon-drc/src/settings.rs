use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DrcError;

/// Tunables for a verification run. Every field has a default, so a
/// settings file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrcSettings {
    /// Providers report progress and check for cancellation every this many items.
    pub progress_interval: usize,
    /// Stop recording violations after this many. `None` records everything.
    pub max_violations: Option<usize>,
    /// Emit an info diagnostic for unconditional rules that shadow later rules of the same type.
    pub warn_on_shadowed_rules: bool,
}

impl Default for DrcSettings {
    fn default() -> Self {
        Self {
            progress_interval: 1000,
            max_violations: None,
            warn_on_shadowed_rules: false,
        }
    }
}

impl DrcSettings {
    pub fn from_json(json: &str) -> Result<Self, DrcError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, DrcError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
