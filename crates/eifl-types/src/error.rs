//! Unified error enumeration for the EIFL core.
//!
//! Mirrors the kinds enumerated in the design's error-handling section so
//! that a boundary adapter (the out-of-scope HTTP façade) can match on kind
//! to pick a status code, instead of threading opaque `anyhow::Error`s
//! through the whole stack.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EiflError {
    /// Malformed manifest, bad secret name, out-of-range concurrency, etc.
    #[error("validation failed for `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// Missing entity referenced by a request.
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    /// Duplicate project name, duplicate secret name at scope, etc.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing or unknown runner token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Cancel attempted on a run that is already terminal, or similar.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// A cron expression could not be parsed or never fires.
    #[error("invalid cron expression `{expr}`: {reason}")]
    InvalidCron { expr: String, reason: String },

    /// AEAD decryption failed (wrong key, corrupted ciphertext).
    #[error("failed to decrypt secret `{name}`")]
    Decrypt { name: String },

    /// `EIFL_ENCRYPTION_KEY` is not set; secret management is unavailable.
    #[error("secret management is not configured: EIFL_ENCRYPTION_KEY is not set")]
    EncryptionNotConfigured,

    /// `EIFL_ENCRYPTION_KEY` is set but fails basic validation (too short).
    #[error("invalid encryption configuration: {0}")]
    Configuration(String),

    /// Transient store failure; the caller may retry.
    #[error("store error: {0}")]
    Store(String),
}

impl EiflError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error kind is safe to retry at the same layer that
    /// raised it (store contention, not a logic error).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, EiflError>;
