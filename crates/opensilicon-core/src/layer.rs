use serde::{Deserialize, Serialize};

use crate::wildcard::Pattern;

/// A unique layer identifier (typically GDS layer number).
pub type LayerId = u32;

/// Physical role of a layer in the technology stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Conductor,
    Cut,
    Dielectric,
    Marker,
}

/// A technology layer rules can refer to by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    #[serde(default)]
    pub description: String,
}

impl Layer {
    pub fn new(id: LayerId, name: &str, kind: LayerKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            description: String::new(),
        }
    }
}

/// The name-to-id table for a design's layers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn get_layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Display name for `id`, falling back to the numeric id.
    pub fn layer_name(&self, id: LayerId) -> String {
        self.get_layer(id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }

    pub fn layer_matches(&self, id: LayerId, pattern: &Pattern) -> bool {
        self.get_layer(id).is_some_and(|l| pattern.is_match(&l.name))
    }

    pub fn all_layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}
