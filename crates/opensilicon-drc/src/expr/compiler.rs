//! Lowering from the expression tree to a flat instruction list.

use log::debug;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::error::{CompileError, CompileErrorKind};
use super::functions::Builtin;
use super::program::{
    ArithOp, CompareOp, CompiledExpression, Instruction, LogicOp, Slot, SlotTable,
};
use super::{lexer, parser, properties};
use crate::value::Value;

/// Compile a condition against the given slot names.
///
/// Syntax errors, unknown slots and unknown functions are hard errors.
/// Fields that no object kind defines are not: they compile to an
/// instruction that always yields `Undefined`.
pub fn compile(text: &str, slots: &SlotTable) -> Result<CompiledExpression, CompileError> {
    let tokens = lexer::lex(text)?;
    let ast = parser::parse(&tokens)?;
    let mut code = Vec::new();
    lower(&ast, slots, &mut code)?;
    Ok(CompiledExpression::new(text, code))
}

fn lower(expr: &Expr, slots: &SlotTable, code: &mut Vec<Instruction>) -> Result<(), CompileError> {
    match expr {
        Expr::Number(n) => code.push(Instruction::PushLiteral(Value::Numeric(*n))),
        // Wildcard literals are compiled to patterns here, once.
        Expr::Str(s) => code.push(Instruction::PushLiteral(Value::from_literal(s))),

        Expr::Ident { name, offset } => match slots.get(name) {
            Some(Slot::Layer) => code.push(Instruction::PushSlot(Slot::Layer)),
            Some(_) => {
                return Err(CompileError::new(
                    CompileErrorKind::SlotNeedsField,
                    *offset,
                    name.as_str(),
                ))
            }
            // Bare words are enumerated values, compared as strings.
            None => code.push(Instruction::PushLiteral(Value::String(name.clone()))),
        },

        Expr::Field {
            slot,
            field,
            offset,
        } => {
            let slot = resolve_slot(slots, slot, *offset)?;
            match properties::resolve_field(field).filter(|_| slot.is_object()) {
                Some(accessors) => code.push(Instruction::PushField {
                    slot,
                    field: field.clone(),
                    accessors,
                }),
                None => {
                    debug!("field '{field}' is not defined for {slot:?}; compiled as undefined");
                    code.push(Instruction::PushUndefined);
                }
            }
        }

        Expr::Method {
            slot,
            name,
            args,
            offset,
        } => {
            let receiver = resolve_slot(slots, slot, *offset)?;
            let function = Builtin::lookup(name, true)
                .filter(|_| receiver.is_object())
                .ok_or_else(|| {
                    CompileError::new(CompileErrorKind::UnknownFunction, *offset, name.as_str())
                })?;
            lower_call(function, Some(receiver), args, *offset, slots, code)?;
        }

        Expr::Call { name, args, offset } => {
            let function = Builtin::lookup(name, false).ok_or_else(|| {
                CompileError::new(CompileErrorKind::UnknownFunction, *offset, name.as_str())
            })?;
            lower_call(function, None, args, *offset, slots, code)?;
        }

        Expr::Unary { op, operand } => {
            lower(operand, slots, code)?;
            code.push(match op {
                UnaryOp::Not => Instruction::Logic(LogicOp::Not),
                UnaryOp::Neg => Instruction::Arith(ArithOp::Neg),
            });
        }

        Expr::Binary { op, lhs, rhs } => {
            lower(lhs, slots, code)?;
            lower(rhs, slots, code)?;
            code.push(match op {
                BinaryOp::Or => Instruction::Logic(LogicOp::Or),
                BinaryOp::And => Instruction::Logic(LogicOp::And),
                BinaryOp::Eq => Instruction::Compare(CompareOp::Eq),
                BinaryOp::Neq => Instruction::Compare(CompareOp::Neq),
                BinaryOp::Lt => Instruction::Compare(CompareOp::Lt),
                BinaryOp::Lte => Instruction::Compare(CompareOp::Lte),
                BinaryOp::Gt => Instruction::Compare(CompareOp::Gt),
                BinaryOp::Gte => Instruction::Compare(CompareOp::Gte),
                BinaryOp::Add => Instruction::Arith(ArithOp::Add),
                BinaryOp::Sub => Instruction::Arith(ArithOp::Sub),
                BinaryOp::Mul => Instruction::Arith(ArithOp::Mul),
                BinaryOp::Div => Instruction::Arith(ArithOp::Div),
            });
        }
    }
    Ok(())
}

fn resolve_slot(slots: &SlotTable, name: &str, offset: usize) -> Result<Slot, CompileError> {
    slots
        .get(name)
        .ok_or_else(|| CompileError::new(CompileErrorKind::UnknownSlot, offset, name))
}

fn lower_call(
    function: Builtin,
    receiver: Option<Slot>,
    args: &[Expr],
    offset: usize,
    slots: &SlotTable,
    code: &mut Vec<Instruction>,
) -> Result<(), CompileError> {
    if args.len() != function.arity() {
        return Err(CompileError::new(
            CompileErrorKind::Arity {
                expected: function.arity(),
                found: args.len(),
            },
            offset,
            function.name(),
        ));
    }
    for arg in args {
        lower(arg, slots, code)?;
    }
    code.push(Instruction::Call {
        function,
        receiver,
        arity: args.len(),
    });
    Ok(())
}
