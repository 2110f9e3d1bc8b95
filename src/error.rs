//! Error taxonomy shared by the auth, developer and contact flows.
//!
//! Every flow catches failures at its boundary and returns a `FlowError`;
//! the HTTP layer turns it into a JSON envelope (see `api::error`).

use thiserror::Error;

/// Message shown for every failed login, whatever the cause.
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid email or password";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlowError {
    /// Local, pre-call, user-fixable.
    #[error("{0}")]
    Validation(String),

    /// No active admin row for the supplied email.
    #[error("admin account not found")]
    NotFound,

    /// Password did not verify against the stored hash.
    #[error("invalid credential")]
    InvalidCredential,

    /// Transport or service-side failure.
    #[error("{0}")]
    Remote(String),
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    /// The text a user gets to see. Lookup and credential failures collapse
    /// into one message so the response never reveals which part was wrong.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::NotFound | FlowError::InvalidCredential => {
                INVALID_LOGIN_MESSAGE.to_string()
            }
            FlowError::Validation(msg) | FlowError::Remote(msg) => msg.clone(),
        }
    }
}
