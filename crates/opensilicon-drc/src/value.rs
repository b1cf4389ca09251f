//! Runtime values produced by condition expressions.

use std::fmt;
use std::sync::Arc;

use opensilicon_core::{wildcard, LayerId, LayerStack, Pattern};

/// A tagged runtime value. Values are immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A number in canonical units (nanometers for lengths).
    Numeric(f64),
    String(String),
    /// A string literal written with `*` or `?`, compiled when the condition is.
    Pattern(Arc<Pattern>),
    /// A layer of the design, compared against names through the layer table.
    LayerRef(LayerId),
    /// The result of reading a field the bound object does not have.
    Undefined,
}

impl Value {
    pub fn from_bool(b: bool) -> Self {
        Value::Numeric(if b { 1.0 } else { 0.0 })
    }

    /// Value for a quoted literal: a pattern if it has wildcards, else a plain string.
    pub fn from_literal(text: &str) -> Self {
        if wildcard::has_wildcard(text) {
            Value::Pattern(Arc::new(Pattern::new(text)))
        } else {
            Value::String(text.to_string())
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Boolean coercion: only a non-zero number is true.
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Numeric(n) if *n != 0.0)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Numeric(_) => "numeric",
            Value::String(_) => "string",
            Value::Pattern(_) => "pattern",
            Value::LayerRef(_) => "layer",
            Value::Undefined => "undefined",
        }
    }

    /// Type-aware equality.
    ///
    /// Returns `None` when either side is undefined. Two strings compare
    /// exactly, whatever they contain; only a [`Value::Pattern`] matches by
    /// wildcard. A layer compared with a string or pattern goes through its
    /// name in `layers`.
    pub fn equals(&self, other: &Value, layers: &LayerStack) -> Option<bool> {
        let eq = match (self, other) {
            (Value::Undefined, _) | (_, Value::Undefined) => return None,
            (Value::Numeric(a), Value::Numeric(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::String(s), Value::Pattern(p)) | (Value::Pattern(p), Value::String(s)) => {
                p.is_match(s)
            }
            (Value::Pattern(a), Value::Pattern(b)) => a == b,
            (Value::LayerRef(a), Value::LayerRef(b)) => a == b,
            (Value::LayerRef(id), Value::String(name))
            | (Value::String(name), Value::LayerRef(id)) => layers
                .get_layer(*id)
                .is_some_and(|l| l.name == *name),
            (Value::LayerRef(id), Value::Pattern(p)) | (Value::Pattern(p), Value::LayerRef(id)) => {
                layers.layer_matches(*id, p)
            }
            _ => false,
        };
        Some(eq)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Numeric(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Pattern(p) => write!(f, "glob '{p}'"),
            Value::LayerRef(id) => write!(f, "layer#{id}"),
            Value::Undefined => f.write_str("<undefined>"),
        }
    }
}
