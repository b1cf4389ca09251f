use std::collections::HashMap;
use std::fmt;

use super::functions::Builtin;
use super::properties::FieldAccessors;
use crate::value::Value;

/// The fixed object slots a condition can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// First object of the pair under test.
    First,
    /// Second object of the pair under test.
    Second,
    /// Layer the check is running on.
    Layer,
}

impl Slot {
    pub fn is_object(self) -> bool {
        matches!(self, Slot::First | Slot::Second)
    }
}

/// Slot names known to the compiler.
#[derive(Debug, Clone)]
pub struct SlotTable {
    names: HashMap<String, Slot>,
}

impl SlotTable {
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &str, slot: Slot) -> Self {
        self.names.insert(name.to_string(), slot);
        self
    }

    pub fn get(&self, name: &str) -> Option<Slot> {
        self.names.get(name).copied()
    }
}

impl Default for SlotTable {
    /// `A` and `B` for the object pair, `L` for the layer.
    fn default() -> Self {
        SlotTable::empty()
            .with("A", Slot::First)
            .with("B", Slot::Second)
            .with("L", Slot::Layer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
}

/// One step of the stack machine.
#[derive(Debug, Clone)]
pub enum Instruction {
    PushLiteral(Value),
    /// Read a field of an object slot through the accessor for the bound object's kind.
    PushField {
        slot: Slot,
        field: String,
        accessors: FieldAccessors,
    },
    /// Push a slot's own value (only the layer slot has one).
    PushSlot(Slot),
    /// A field no object kind defines.
    PushUndefined,
    Call {
        function: Builtin,
        receiver: Option<Slot>,
        arity: usize,
    },
    Compare(CompareOp),
    Logic(LogicOp),
    Arith(ArithOp),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushLiteral(v) => write!(f, "push {v}"),
            Instruction::PushField { slot, field, .. } => write!(f, "field {slot:?}.{field}"),
            Instruction::PushSlot(slot) => write!(f, "slot {slot:?}"),
            Instruction::PushUndefined => f.write_str("undefined"),
            Instruction::Call {
                function,
                receiver: Some(slot),
                arity,
            } => write!(f, "call {slot:?}.{}/{arity}", function.name()),
            Instruction::Call {
                function, arity, ..
            } => write!(f, "call {}/{arity}", function.name()),
            Instruction::Compare(op) => write!(f, "cmp {op:?}"),
            Instruction::Logic(op) => write!(f, "logic {op:?}"),
            Instruction::Arith(op) => write!(f, "arith {op:?}"),
        }
    }
}

/// A condition lowered to a flat instruction list.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    code: Vec<Instruction>,
}

impl CompiledExpression {
    pub fn new(source: impl Into<String>, code: Vec<Instruction>) -> Self {
        Self {
            source: source.into(),
            code,
        }
    }

    /// Stub installed for conditions that failed to compile: never matches.
    pub fn always_false(source: impl Into<String>) -> Self {
        Self::new(source, vec![Instruction::PushLiteral(Value::from_bool(false))])
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    /// One line per instruction, for debugging and tests.
    pub fn disassemble(&self) -> Vec<String> {
        self.code.iter().map(ToString::to_string).collect()
    }
}
