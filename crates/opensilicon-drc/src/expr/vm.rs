//! Stack-machine interpreter for compiled conditions.
//!
//! Evaluation is a pure function of the compiled code and the context; the
//! operand stack is local to each call.

use opensilicon_core::{LayerId, LayerStack, LayoutItem};

use super::program::{ArithOp, CompareOp, CompiledExpression, Instruction, LogicOp, Slot};
use crate::value::Value;

/// Concrete bindings for the slots of a condition.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub first: Option<&'a LayoutItem>,
    pub second: Option<&'a LayoutItem>,
    pub layer: Option<LayerId>,
    /// Name table used to compare layers against strings.
    pub layers: &'a LayerStack,
}

impl<'a> EvalContext<'a> {
    pub fn new(layers: &'a LayerStack) -> Self {
        Self {
            first: None,
            second: None,
            layer: None,
            layers,
        }
    }

    pub fn with_first(mut self, item: &'a LayoutItem) -> Self {
        self.first = Some(item);
        self
    }

    pub fn with_second(mut self, item: &'a LayoutItem) -> Self {
        self.second = Some(item);
        self
    }

    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer = Some(layer);
        self
    }

    fn object(&self, slot: Slot) -> Option<&'a LayoutItem> {
        match slot {
            Slot::First => self.first,
            Slot::Second => self.second,
            Slot::Layer => None,
        }
    }
}

/// Run `code` against `ctx` and return the value left on the stack.
pub fn evaluate(code: &CompiledExpression, ctx: &EvalContext<'_>) -> Value {
    let mut stack: Vec<Value> = Vec::with_capacity(code.code().len());

    for instruction in code.code() {
        let result = match instruction {
            Instruction::PushLiteral(v) => v.clone(),

            Instruction::PushField {
                slot, accessors, ..
            } => ctx
                .object(*slot)
                .and_then(|item| accessors[item.kind().index()].map(|read| read(item)))
                .unwrap_or(Value::Undefined),

            Instruction::PushSlot(slot) => match slot {
                Slot::Layer => ctx.layer.map(Value::LayerRef).unwrap_or(Value::Undefined),
                _ => Value::Undefined,
            },

            Instruction::PushUndefined => Value::Undefined,

            Instruction::Call {
                function,
                receiver,
                arity,
            } => {
                let args = stack.split_off(stack.len().saturating_sub(*arity));
                let receiver = receiver.and_then(|slot| ctx.object(slot));
                function.call(receiver, &args, ctx.layers)
            }

            Instruction::Compare(op) => {
                let rhs = pop(&mut stack);
                let lhs = pop(&mut stack);
                compare(*op, &lhs, &rhs, ctx.layers)
            }

            Instruction::Logic(LogicOp::Not) => {
                let operand = pop(&mut stack);
                if operand.is_undefined() {
                    Value::from_bool(false)
                } else {
                    Value::from_bool(!operand.is_truthy())
                }
            }

            Instruction::Logic(op) => {
                let rhs = pop(&mut stack);
                let lhs = pop(&mut stack);
                if lhs.is_undefined() || rhs.is_undefined() {
                    Value::from_bool(false)
                } else if *op == LogicOp::And {
                    Value::from_bool(lhs.is_truthy() && rhs.is_truthy())
                } else {
                    Value::from_bool(lhs.is_truthy() || rhs.is_truthy())
                }
            }

            Instruction::Arith(ArithOp::Neg) => match pop(&mut stack) {
                Value::Numeric(n) => Value::Numeric(-n),
                _ => Value::Undefined,
            },

            Instruction::Arith(op) => {
                let rhs = pop(&mut stack);
                let lhs = pop(&mut stack);
                arith(*op, &lhs, &rhs)
            }
        };
        stack.push(result);
    }

    pop(&mut stack)
}

/// Evaluate and coerce to a boolean. Undefined results are false.
pub fn evaluate_condition(code: &CompiledExpression, ctx: &EvalContext<'_>) -> bool {
    evaluate(code, ctx).is_truthy()
}

fn pop(stack: &mut Vec<Value>) -> Value {
    stack.pop().unwrap_or(Value::Undefined)
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value, layers: &LayerStack) -> Value {
    match op {
        CompareOp::Eq => lhs.equals(rhs, layers).map_or(Value::Undefined, Value::from_bool),
        CompareOp::Neq => lhs
            .equals(rhs, layers)
            .map_or(Value::Undefined, |eq| Value::from_bool(!eq)),
        _ => {
            let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
                return Value::Undefined;
            };
            Value::from_bool(match op {
                CompareOp::Lt => a < b,
                CompareOp::Lte => a <= b,
                CompareOp::Gt => a > b,
                _ => a >= b,
            })
        }
    }
}

fn arith(op: ArithOp, lhs: &Value, rhs: &Value) -> Value {
    let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
        return Value::Undefined;
    };
    match op {
        ArithOp::Add => Value::Numeric(a + b),
        ArithOp::Sub => Value::Numeric(a - b),
        ArithOp::Mul => Value::Numeric(a * b),
        ArithOp::Div if b == 0.0 => Value::Undefined,
        ArithOp::Div => Value::Numeric(a / b),
        ArithOp::Neg => Value::Numeric(-a),
    }
}
