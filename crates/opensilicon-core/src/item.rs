use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{BBox, GeomPrimitive};
use crate::LayerId;

/// Unique item identifier.
pub type ItemId = Uuid;

/// The closed set of object kinds a rule condition can be evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Rect,
    Polygon,
    Path,
    Via,
}

impl ObjectKind {
    pub const COUNT: usize = 4;
    pub const ALL: [ObjectKind; ObjectKind::COUNT] = [
        ObjectKind::Rect,
        ObjectKind::Polygon,
        ObjectKind::Path,
        ObjectKind::Via,
    ];

    /// Dense index, stable for the lifetime of the program.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name exposed to rule conditions through the `Type` field.
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Rect => "Rect",
            ObjectKind::Polygon => "Polygon",
            ObjectKind::Path => "Track",
            ObjectKind::Via => "Via",
        }
    }

    /// Lowercase keyword used by categorical constraints such as `disallow`.
    pub fn keyword(self) -> &'static str {
        match self {
            ObjectKind::Rect => "rect",
            ObjectKind::Polygon => "polygon",
            ObjectKind::Path => "track",
            ObjectKind::Via => "via",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single design object: a shape plus its connectivity attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub net: Option<String>,
    #[serde(default)]
    pub net_class: Option<String>,
    pub shape: GeomPrimitive,
}

impl LayoutItem {
    pub fn new(shape: GeomPrimitive) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            net: None,
            net_class: None,
            shape,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_net(mut self, net: &str) -> Self {
        self.net = Some(net.to_string());
        self
    }

    pub fn with_net_class(mut self, net_class: &str) -> Self {
        self.net_class = Some(net_class.to_string());
        self
    }

    pub fn kind(&self) -> ObjectKind {
        match self.shape {
            GeomPrimitive::Rect(_) => ObjectKind::Rect,
            GeomPrimitive::Polygon(_) => ObjectKind::Polygon,
            GeomPrimitive::Path(_) => ObjectKind::Path,
            GeomPrimitive::Via(_) => ObjectKind::Via,
        }
    }

    pub fn layers(&self) -> Vec<LayerId> {
        self.shape.layers()
    }

    pub fn on_layer(&self, layer: LayerId) -> bool {
        self.layers().contains(&layer)
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.shape.bbox()
    }

    /// Two items are electrically connected when they share a named net.
    pub fn same_net(&self, other: &LayoutItem) -> bool {
        matches!((&self.net, &other.net), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect, Via};

    #[test]
    fn test_kind_and_layers() {
        let rect = LayoutItem::new(GeomPrimitive::Rect(Rect::new(4, 0.0, 0.0, 10.0, 10.0)));
        assert_eq!(rect.kind(), ObjectKind::Rect);
        assert!(rect.on_layer(4));
        assert!(!rect.on_layer(5));

        let via = LayoutItem::new(GeomPrimitive::Via(Via::new(
            1,
            3,
            2,
            Point::new(0.0, 0.0),
            10.0,
            10.0,
        )));
        assert_eq!(via.kind(), ObjectKind::Via);
        assert!(via.on_layer(2));
        assert_eq!(via.kind().keyword(), "via");
    }

    #[test]
    fn test_same_net_requires_names() {
        let shape = GeomPrimitive::Rect(Rect::new(0, 0.0, 0.0, 1.0, 1.0));
        let a = LayoutItem::new(shape.clone()).with_net("VDD");
        let b = LayoutItem::new(shape.clone()).with_net("VDD");
        let c = LayoutItem::new(shape.clone());
        let d = LayoutItem::new(shape);
        assert!(a.same_net(&b));
        assert!(!a.same_net(&c));
        assert!(!c.same_net(&d));
    }

    #[test]
    fn test_kind_index_is_dense() {
        for (i, kind) in ObjectKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
