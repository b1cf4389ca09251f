//! Rule-condition expressions.
//!
//! A condition string is lexed, parsed into an [`ast::Expr`], and lowered
//! into a [`CompiledExpression`]: a flat list of stack-machine
//! instructions with slot, field and function references resolved up front.
//! [`vm::evaluate`] then runs that list against an [`EvalContext`] binding
//! the slots to concrete layout items.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod properties;
pub mod vm;

pub use compiler::compile;
pub use error::{CompileError, CompileErrorKind};
pub use program::{CompiledExpression, Instruction, Slot, SlotTable};
pub use vm::{evaluate, evaluate_condition, EvalContext};
