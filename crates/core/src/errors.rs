//! Error types for the bibmerge core library.
//!
//! The merge operations themselves are total and never fail; errors only
//! arise at the edges: building a checked snapshot, turning a human
//! resolution into plan edits, and loading configuration. Each concern has
//! its own `thiserror` enum, and [`CoreError`] unifies them for callers that
//! want a single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Model errors
// ---------------------------------------------------------------------------

/// Errors from constructing the in-memory record model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Two records in one snapshot share a citation key.
    #[error("duplicate citation key '{0}' in snapshot")]
    DuplicateCitationKey(String),
}

// ---------------------------------------------------------------------------
// Conflict errors
// ---------------------------------------------------------------------------

/// Errors from turning a conflict resolution into plan edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConflictError {
    /// The resolution names a field that is not part of the conflict.
    #[error("field '{field}' is not in conflict for entry '{citation_key}'")]
    UnknownField {
        citation_key: String,
        field: String,
    },

    /// The resolution cannot be expressed against the local snapshot.
    #[error("invalid resolution for entry '{citation_key}': {detail}")]
    InvalidResolution {
        citation_key: String,
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
