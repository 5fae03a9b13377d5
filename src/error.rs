//! # Presentation Exchange Errors
//!
//! Constraint failures are not errors: they are collected as `Error`-status
//! check results in the evaluation log. Only malformed inputs and contract
//! violations surface through this module.

use thiserror::Error;

/// Errors returned by the Presentation Exchange API.
#[derive(Error, Debug)]
pub enum Error {
    /// The Presentation Definition is malformed.
    #[error("invalid presentation definition: {0}")]
    InvalidDefinition(String),

    /// A supplied credential or presentation could not be decoded to JSON.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A JSONPath expression in the definition failed to parse.
    #[error("invalid JSONPath: {0}")]
    InvalidPath(String),

    /// No assignment of credentials satisfies the definition's submission
    /// requirements.
    #[error("submission requirements not satisfied: {0}")]
    SubmissionFailure(String),

    /// An unexpected internal failure.
    #[error("server error: {0}")]
    ServerError(#[from] anyhow::Error),
}

/// Result type for Presentation Exchange operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
