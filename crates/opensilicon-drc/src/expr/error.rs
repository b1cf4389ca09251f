use thiserror::Error;

/// What went wrong while compiling a condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character")]
    UnexpectedChar,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid number")]
    InvalidNumber,

    #[error("unknown unit")]
    UnknownUnit,

    #[error("unexpected token")]
    UnexpectedToken,

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unknown slot")]
    UnknownSlot,

    #[error("slot must be followed by a field")]
    SlotNeedsField,

    #[error("unknown function")]
    UnknownFunction,

    #[error("expected {expected} argument(s), found {found}")]
    Arity { expected: usize, found: usize },
}

/// A hard compilation failure, located by byte offset into the source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at offset {offset} ('{token}')")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub offset: usize,
    pub token: String,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, offset: usize, token: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            token: token.into(),
        }
    }
}
