use opensilicon_core::{LayerStack, LayoutItem};

use crate::value::Value;

/// Functions a condition may call. Resolved by name at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `Slot.existsOnLayer(pattern)`
    ExistsOnLayer,
    Abs,
    Min,
    Max,
}

impl Builtin {
    /// Look up a builtin by name. Methods and free functions live in separate namespaces.
    pub fn lookup(name: &str, is_method: bool) -> Option<Builtin> {
        match (name, is_method) {
            ("existsOnLayer", true) => Some(Builtin::ExistsOnLayer),
            ("abs", false) => Some(Builtin::Abs),
            ("min", false) => Some(Builtin::Min),
            ("max", false) => Some(Builtin::Max),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::ExistsOnLayer => "existsOnLayer",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
        }
    }

    /// Number of explicit arguments (the receiver of a method is not counted).
    pub fn arity(self) -> usize {
        match self {
            Builtin::ExistsOnLayer | Builtin::Abs => 1,
            Builtin::Min | Builtin::Max => 2,
        }
    }

    /// Apply the builtin. Any undefined input yields `Undefined`.
    pub fn call(self, receiver: Option<&LayoutItem>, args: &[Value], layers: &LayerStack) -> Value {
        if args.iter().any(Value::is_undefined) {
            return Value::Undefined;
        }
        match self {
            Builtin::ExistsOnLayer => {
                let (Some(item), [name @ (Value::String(_) | Value::Pattern(_))]) = (receiver, args)
                else {
                    return Value::Undefined;
                };
                Value::from_bool(
                    item.layers()
                        .iter()
                        .any(|l| Value::LayerRef(*l).equals(name, layers) == Some(true)),
                )
            }
            Builtin::Abs => match args {
                [Value::Numeric(n)] => Value::Numeric(n.abs()),
                _ => Value::Undefined,
            },
            Builtin::Min => match args {
                [Value::Numeric(a), Value::Numeric(b)] => Value::Numeric(a.min(*b)),
                _ => Value::Undefined,
            },
            Builtin::Max => match args {
                [Value::Numeric(a), Value::Numeric(b)] => Value::Numeric(a.max(*b)),
                _ => Value::Undefined,
            },
        }
    }
}
