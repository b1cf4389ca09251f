use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::item::{ItemId, LayoutItem};
use crate::layer::LayerStack;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Invalid design JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Item {item} references undefined layer {layer}")]
    UndefinedLayer { item: ItemId, layer: u32 },
}

/// The flattened design a verification run walks: the layer stack and every item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDatabase {
    /// Database identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Project name.
    pub name: String,
    /// Technology layers.
    pub layer_stack: LayerStack,
    #[serde(default)]
    items: Vec<LayoutItem>,
}

impl LayoutDatabase {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            layer_stack: LayerStack::new(),
            items: Vec::new(),
        }
    }

    // ── Items ────────────────────────────────────────────────────────

    pub fn add_item(&mut self, item: LayoutItem) -> ItemId {
        let id = item.id;
        self.items.push(item);
        id
    }

    pub fn get_item(&self, id: &ItemId) -> Option<&LayoutItem> {
        self.items.iter().find(|i| i.id == *id)
    }

    pub fn items(&self) -> &[LayoutItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Check that every item only references layers defined in the stack.
    pub fn validate(&self) -> Result<(), DatabaseError> {
        for item in &self.items {
            for layer in item.layers() {
                if self.layer_stack.get_layer(layer).is_none() {
                    return Err(DatabaseError::UndefinedLayer {
                        item: item.id,
                        layer,
                    });
                }
            }
        }
        Ok(())
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, DatabaseError> {
        let db: Self = serde_json::from_str(json)?;
        db.validate()?;
        debug!(
            "loaded design '{}' ({} items, {} layers)",
            db.name,
            db.item_count(),
            db.layer_stack.layer_count()
        );
        Ok(db)
    }
}
