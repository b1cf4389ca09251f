//! Per-kind field tables.
//!
//! Each object kind publishes the fields a condition may read. Lookups are
//! done once at compile time; the compiled instruction carries one accessor
//! per kind so evaluation is a plain indexed call.

use opensilicon_core::{GeomPrimitive, LayoutItem, ObjectKind};

use crate::value::Value;

pub type Accessor = fn(&LayoutItem) -> Value;

/// One optional accessor per [`ObjectKind`], indexed by [`ObjectKind::index`].
pub type FieldAccessors = [Option<Accessor>; ObjectKind::COUNT];

/// Net class reported for items that do not carry one.
pub const DEFAULT_NET_CLASS: &str = "Default";

const COMMON_FIELDS: &[(&str, Accessor)] = &[
    ("Type", |item| Value::String(item.kind().name().to_string())),
    ("Name", |item| Value::String(item.name.clone())),
    ("Net", |item| {
        Value::String(item.net.clone().unwrap_or_default())
    }),
    ("NetClass", |item| {
        Value::String(
            item.net_class
                .clone()
                .unwrap_or_else(|| DEFAULT_NET_CLASS.to_string()),
        )
    }),
];

const RECT_FIELDS: &[(&str, Accessor)] = &[
    ("Layer", |item| match &item.shape {
        GeomPrimitive::Rect(r) => Value::LayerRef(r.layer_id),
        _ => Value::Undefined,
    }),
    ("Width", |item| match &item.shape {
        GeomPrimitive::Rect(r) => Value::Numeric(r.width()),
        _ => Value::Undefined,
    }),
    ("Height", |item| match &item.shape {
        GeomPrimitive::Rect(r) => Value::Numeric(r.height()),
        _ => Value::Undefined,
    }),
    ("Area", |item| match &item.shape {
        GeomPrimitive::Rect(r) => Value::Numeric(r.area()),
        _ => Value::Undefined,
    }),
];

const POLYGON_FIELDS: &[(&str, Accessor)] = &[
    ("Layer", |item| match &item.shape {
        GeomPrimitive::Polygon(p) => Value::LayerRef(p.layer_id),
        _ => Value::Undefined,
    }),
    ("Area", |item| match &item.shape {
        GeomPrimitive::Polygon(p) => Value::Numeric(p.area()),
        _ => Value::Undefined,
    }),
    ("VertexCount", |item| match &item.shape {
        GeomPrimitive::Polygon(p) => Value::Numeric(p.vertex_count() as f64),
        _ => Value::Undefined,
    }),
];

const PATH_FIELDS: &[(&str, Accessor)] = &[
    ("Layer", |item| match &item.shape {
        GeomPrimitive::Path(p) => Value::LayerRef(p.layer_id),
        _ => Value::Undefined,
    }),
    ("Width", |item| match &item.shape {
        GeomPrimitive::Path(p) => Value::Numeric(p.width),
        _ => Value::Undefined,
    }),
    ("Length", |item| match &item.shape {
        GeomPrimitive::Path(p) => Value::Numeric(p.length()),
        _ => Value::Undefined,
    }),
];

// Vias span several layers, so they have no single `Layer`.
const VIA_FIELDS: &[(&str, Accessor)] = &[
    ("Width", |item| match &item.shape {
        GeomPrimitive::Via(v) => Value::Numeric(v.width),
        _ => Value::Undefined,
    }),
    ("Height", |item| match &item.shape {
        GeomPrimitive::Via(v) => Value::Numeric(v.height),
        _ => Value::Undefined,
    }),
    ("Size", |item| match &item.shape {
        GeomPrimitive::Via(v) => Value::Numeric(v.size()),
        _ => Value::Undefined,
    }),
    ("TopLayer", |item| match &item.shape {
        GeomPrimitive::Via(v) => Value::LayerRef(v.top_layer),
        _ => Value::Undefined,
    }),
    ("BottomLayer", |item| match &item.shape {
        GeomPrimitive::Via(v) => Value::LayerRef(v.bottom_layer),
        _ => Value::Undefined,
    }),
    ("CutLayer", |item| match &item.shape {
        GeomPrimitive::Via(v) => Value::LayerRef(v.cut_layer),
        _ => Value::Undefined,
    }),
];

fn kind_fields(kind: ObjectKind) -> &'static [(&'static str, Accessor)] {
    match kind {
        ObjectKind::Rect => RECT_FIELDS,
        ObjectKind::Polygon => POLYGON_FIELDS,
        ObjectKind::Path => PATH_FIELDS,
        ObjectKind::Via => VIA_FIELDS,
    }
}

/// Look up `field` for a single kind.
pub fn field_accessor(kind: ObjectKind, field: &str) -> Option<Accessor> {
    COMMON_FIELDS
        .iter()
        .chain(kind_fields(kind))
        .find(|(name, _)| *name == field)
        .map(|(_, accessor)| *accessor)
}

/// Resolve `field` across every kind. `None` when no kind defines it.
pub fn resolve_field(field: &str) -> Option<FieldAccessors> {
    let mut accessors: FieldAccessors = [None; ObjectKind::COUNT];
    for kind in ObjectKind::ALL {
        accessors[kind.index()] = field_accessor(kind, field);
    }
    accessors.iter().any(Option::is_some).then_some(accessors)
}
