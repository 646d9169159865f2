//! Bridge errors.

use std::path::PathBuf;

use thiserror::Error;

use super::bridge::Stage;
use super::types::Signature;

/// Every failure the bridge can report. None of them are retried.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("cannot load {}: {reason}", path.display())]
    LoadFailure { path: PathBuf, reason: String },

    #[error("class {0} not found")]
    TypeNotFound(String),

    #[error("cannot instantiate {0}")]
    InstantiationFailed(String),

    #[error("{class} does not respond to {selector}")]
    MethodNotFound {
        class: String,
        selector: &'static str,
    },

    #[error("{selector} has signature {declared}, called as {requested}")]
    SignatureMismatch {
        selector: &'static str,
        declared: Signature,
        requested: Signature,
    },

    #[error("{0} reported failure")]
    CallRejected(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("name contains a NUL byte: {0:?}")]
    InvalidName(String),
}

impl BridgeError {
    /// The startup stage this error prevented the bridge from leaving, if
    /// it was raised during startup.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            BridgeError::LoadFailure { .. } => Some(Stage::Unresolved),
            BridgeError::TypeNotFound(_) => Some(Stage::Loaded),
            BridgeError::InstantiationFailed(_) => Some(Stage::TypeResolved),
            _ => None,
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
