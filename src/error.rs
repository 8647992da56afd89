//! Centralized error types for tagbox.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the tagbox library.
#[derive(Error, Debug)]
pub enum MailError {
    /// The documents could not be reconciled into a valid mail
    /// (no usable `Date`, unrecoverable header shape).
    #[error("Malformed mail: {0}")]
    Malformed(String),

    /// No mail exists for the given ident.
    #[error("Mail not found: {0}")]
    NotFound(String),

    /// The document store rejected or failed a call.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A persisting operation was invoked on a mail not bound to a querier.
    #[error("Mail '{0}' is not bound to a store")]
    NoQuerier(String),

    /// The inbound mail shape could not be interpreted.
    #[error("Invalid input mail: {0}")]
    InvalidInput(String),

    /// The SMTP collaborator refused or failed to take the mail.
    #[error("Sending failed: {0}")]
    Send(String),

    /// A MIME decoding error.
    #[error("MIME decoding error: {0}")]
    Mime(String),

    /// JSON (de)serialization of a document or DTO failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, MailError>`.
pub type Result<T> = std::result::Result<T, MailError>;

impl MailError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for failures confined to a single mail, which a listing may skip.
    pub fn is_per_mail(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::Mime(_))
    }
}
