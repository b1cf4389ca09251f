//! Raw expression tree produced by the parser.
//! Names are unresolved here; slot and field resolution happen during lowering.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    /// A bare identifier: either a slot name or an enumerated literal.
    Ident { name: String, offset: usize },
    /// `Slot.Field`
    Field {
        slot: String,
        field: String,
        offset: usize,
    },
    /// `Slot.method(args)`
    Method {
        slot: String,
        name: String,
        args: Vec<Expr>,
        offset: usize,
    },
    /// `function(args)`
    Call {
        name: String,
        args: Vec<Expr>,
        offset: usize,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}
