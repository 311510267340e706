//! Error types for attestor.
//!
//! This module provides the error hierarchy using `thiserror`. The single
//! write-side failure the registry contract admits is [`AttestorError::AlreadyRegistered`];
//! everything else belongs to parsing, persistence, or the content store.

use thiserror::Error;

use crate::types::Digest;

/// Result type alias using `AttestorError`.
pub type Result<T> = std::result::Result<T, AttestorError>;

/// Main error type for all attestor operations.
#[derive(Debug, Error)]
pub enum AttestorError {
    // ═══════════════════════════════════════════════════════════════════════════
    // REGISTRY ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The digest already has a registration record.
    ///
    /// Carries no payload beyond the offending digest: the existing record is
    /// left untouched and can be read back with a verify query.
    #[error("digest {0} is already registered")]
    AlreadyRegistered(Digest),

    /// The registry state or file is unusable.
    #[error("registry error: {0}")]
    RegistryError(String),

    /// Persisted registry format version is not supported.
    #[error("registry format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build reads and writes.
        expected: u8,
        /// Version found in the file header.
        actual: u8,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A caller-supplied digest string could not be parsed.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// A caller-supplied submitter identity could not be parsed.
    #[error("invalid submitter identity: {0}")]
    InvalidSubmitter(String),

    /// Input validation failed.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Configuration error (missing credentials, malformed endpoint, ...).
    #[error("configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONTENT STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Upload to the content store failed.
    #[error("content upload failed: {0}")]
    UploadFailed(String),

    /// Fetch from the content store failed.
    #[error("content fetch failed for '{pointer}': {reason}")]
    FetchFailed {
        /// Storage pointer that was requested.
        pointer: String,
        /// Provider-reported reason.
        reason: String,
    },

    /// A storage pointer does not look like a content identifier.
    #[error("invalid content identifier: {0}")]
    InvalidContentId(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION & STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid hex encoding.
    #[error("invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AttestorError {
    /// Returns true if this is the write-once conflict.
    ///
    /// Producers may treat a conflict as "already proven" rather than a
    /// failure; every other error is genuinely unexpected.
    pub fn is_conflict(&self) -> bool {
        matches!(self, AttestorError::AlreadyRegistered(_))
    }

    /// Returns true if this error came from rejecting caller input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            AttestorError::InvalidDigest(_)
                | AttestorError::InvalidSubmitter(_)
                | AttestorError::ValidationError(_)
                | AttestorError::InvalidContentId(_)
        )
    }

    /// Returns true if this error is recoverable (can retry).
    ///
    /// Registry writes are never retried by the core; this classifies
    /// content-store and network failures only.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AttestorError::HttpError(_)
                | AttestorError::UploadFailed(_)
                | AttestorError::FetchFailed { .. }
        )
    }
}
