//! Engine error taxonomy.

use std::time::Duration;

use thiserror::Error;

use super::downlink::MalformedEvent;
use crate::protocol::ErrorCode;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("No response to '{command}'")]
    NoResponse { command: String },

    #[error("'{command}' rejected: invalid parameter")]
    InvalidParameter { command: String },

    #[error("'{command}' rejected by module: {code}")]
    Rejected { command: String, code: ErrorCode },

    #[error("Unrecognized response to '{command}': {line}")]
    Unrecognized { command: String, line: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Malformed event: {0}")]
    Malformed(#[from] MalformedEvent),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot parse response to '{command}': '{value}'")]
    Parse { command: String, value: String },
}

impl EngineError {
    /// The module answered but refused the command.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidParameter { .. } | EngineError::Rejected { .. }
        )
    }

    /// The module never answered in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout { .. } | EngineError::NoResponse { .. })
    }

    /// Named error token, if the module sent one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            EngineError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
