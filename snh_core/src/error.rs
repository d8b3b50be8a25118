//! Error types for the snh_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for snh_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A domain invariant was violated (bad vocabulary value, out-of-range
    /// number, blank required text, composite limits)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A collaborator of the wrong kind was supplied
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// The operation is not valid in the current lifecycle state
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Bed already taken in a clinical sector. The message is surfaced as-is.
    #[error("Leito {bed} já ocupado por {occupant}.")]
    BedOccupied { bed: u32, occupant: String },

    /// A delivery strategy failed to send a notification
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Error::StateConflict(msg.into())
    }
}
