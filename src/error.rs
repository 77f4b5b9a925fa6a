//! Error types for the push engine.
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`].
//!
//! Most runtime failures in this engine are deliberately *not* errors in the
//! `Result` sense: transport drops are retried with backoff, orphaned
//! subscriptions are reported through the host's error-event channel, and
//! malformed attributes are skipped. The variants here cover the cases a
//! caller can actually act on.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Declaration | [`Error::InvalidUrl`], [`Error::UnsupportedScheme`] |
//! | Transport | [`Error::Transport`], [`Error::ConnectionClosed`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Declaration Errors
    // ========================================================================
    /// A declared push URL could not be resolved.
    ///
    /// Returned when a connection attribute value does not parse against the
    /// host's base URL.
    #[error("Invalid push URL {value:?}: {source}")]
    InvalidUrl {
        /// The attribute value as written in the markup.
        value: String,
        /// Underlying parse failure.
        #[source]
        source: url::ParseError,
    },

    /// A resolved URL uses a scheme the transport cannot open.
    #[error("Unsupported URL scheme: {scheme}")]
    UnsupportedScheme {
        /// The offending scheme.
        scheme: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Transport creation or handshake failed.
    ///
    /// Recoverable: the connection driver retries with backoff.
    #[error("Transport failed: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The transport channel is closed.
    ///
    /// Returned when emitting on a handle whose consumer side is gone.
    #[error("Connection closed")]
    ConnectionClosed,

    /// WebSocket error from the default transport.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(value: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            value: value.into(),
            source,
        }
    }

    /// Creates an unsupported scheme error.
    #[inline]
    pub fn unsupported_scheme(scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            scheme: scheme.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors feed the reconnection path; the connection driver
    /// retries them with growing, capped delay. Declaration errors never
    /// recover - the markup is wrong.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a declaration (markup) error.
    #[inline]
    #[must_use]
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::UnsupportedScheme { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
