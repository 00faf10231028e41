//! Error types for the fallible edges of the engine.
//!
//! The frame loop itself never fails: missing elements and unavailable
//! storage are skipped. Only loading scenes/traces and touching a
//! file-backed session store report errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KineticError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("session storage is unavailable")]
    StoreUnavailable,

    #[error("unknown element `{0}`")]
    UnknownElement(String),

    #[error("unknown component `{0}`")]
    UnknownComponent(String),
}

pub type Result<T> = std::result::Result<T, KineticError>;

impl KineticError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        KineticError::InvalidConfig(msg.into())
    }
}
