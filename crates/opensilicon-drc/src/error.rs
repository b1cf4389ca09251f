use std::io;

use opensilicon_core::DatabaseError;
use thiserror::Error;

use crate::rules::ConstraintType;

#[derive(Error, Debug)]
pub enum DrcError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid design: {0}")]
    Database(#[from] DatabaseError),

    /// A query for a constraint type no registered provider asked for.
    #[error("Constraint type '{0}' was not requested by any provider")]
    UnregisteredConstraint(ConstraintType),

    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Unknown provider handle {0}")]
    UnknownProvider(usize),
}
