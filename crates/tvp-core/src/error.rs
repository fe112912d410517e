//! Unified error type for the proxy.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for HTTP handlers to derive a status code via [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes of the proxy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "slug", "segment base").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An upstream fetch failed, timed out or returned a non-2xx status.
    #[error("Upstream error [{url}]: {message}")]
    Upstream {
        /// The upstream URL that was being fetched.
        url: String,
        /// Human-readable error description.
        message: String,
    },

    /// A manual refresh was requested for a provider with no scheduler.
    #[error("No scheduler for provider: {0}")]
    TriggerTargetMissing(String),

    /// A provider operation (EPG generation or rebuild) failed.
    #[error("Provider error [{provider}]: {message}")]
    Provider {
        /// Name of the provider that failed.
        provider: String,
        /// Human-readable error description.
        message: String,
    },

    /// Configuration could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Upstream { .. } => 502,
            Error::TriggerTargetMissing(_) => 404,
            Error::Provider { .. } => 500,
            Error::Config(_) => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Upstream`].
    pub fn upstream(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Upstream {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Provider`].
    pub fn provider(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Provider {
            provider: provider.into(),
            message: message.to_string(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
