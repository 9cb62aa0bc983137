use crate::{Error, Expr};
use std::fmt::{self, Display, Formatter};

/// Failure classes raised by the core.
///
/// Values of this type travel inside [`Error`] (either as the error itself or as a context
/// layer), callers classify a failure with `error.downcast_ref::<OrmError>()`.
#[derive(Debug)]
pub enum OrmError {
    /// Mapping metadata is missing, ambiguous or cyclic. Never retried.
    Configuration(String),
    /// No expression rule accepts the node.
    NotCompilable { node: Box<Expr>, reason: String },
    /// A command builder was finalized without something it requires.
    StatementState(String),
    /// The underlying connection failed.
    Connection(String),
}

impl OrmError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, OrmError::Configuration(..))
    }
    pub fn is_not_compilable(&self) -> bool {
        matches!(self, OrmError::NotCompilable { .. })
    }
    pub fn is_statement_state(&self) -> bool {
        matches!(self, OrmError::StatementState(..))
    }
    pub fn is_connection(&self) -> bool {
        matches!(self, OrmError::Connection(..))
    }
    /// The offending node of a `NotCompilable` error.
    pub fn node(&self) -> Option<&Expr> {
        match self {
            OrmError::NotCompilable { node, .. } => Some(node),
            _ => None,
        }
    }
}

impl Display for OrmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OrmError::Configuration(message) => write!(f, "Mapping configuration error: {message}"),
            OrmError::NotCompilable { node, reason } => {
                write!(f, "Expression is not compilable ({reason}): {node:?}")
            }
            OrmError::StatementState(message) => write!(f, "Invalid statement state: {message}"),
            OrmError::Connection(message) => write!(f, "Connection error: {message}"),
        }
    }
}

impl std::error::Error for OrmError {}

pub fn configuration_error(message: impl Into<String>) -> Error {
    Error::new(OrmError::Configuration(message.into()))
}

pub fn not_compilable(node: &Expr, reason: impl Into<String>) -> Error {
    Error::new(OrmError::NotCompilable {
        node: Box::new(node.clone()),
        reason: reason.into(),
    })
}

pub fn statement_state_error(message: impl Into<String>) -> Error {
    Error::new(OrmError::StatementState(message.into()))
}
