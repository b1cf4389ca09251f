//! Rules, constraints and the rule document format.

pub mod constraint;
pub mod parser;
pub mod rule;
pub mod sexpr;

pub use constraint::{Constraint, ConstraintType, ConstraintValue, MinOptMax};
pub use parser::{parse_rules, parse_rules_with_slots, ParsedRules};
pub use rule::Rule;
