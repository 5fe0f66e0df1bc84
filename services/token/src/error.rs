//! Error types for token issuance and verification.
//!
//! Issuance and setup failures are [`TokenError`]. Verification outcomes are
//! [`VerifyError`], one variant per rejection step so callers can tell them
//! apart without parsing messages.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while configuring the service or issuing a token.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TokenError {
    /// Subject was empty at issuance
    #[error("Token subject must not be empty")]
    EmptySubject,

    /// TTL was zero, sub-second or too large to represent
    #[error("Invalid token TTL: {0}")]
    InvalidTtl(String),

    /// Injected secret is shorter than the minimum key length
    #[error("Signing secret too short: {actual} bytes, need at least {minimum}")]
    WeakSecret {
        /// Length of the rejected secret
        actual: usize,
        /// Minimum accepted length
        minimum: usize,
    },

    /// Secure random source unavailable
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Header or claims could not be serialized
    #[error("Token encoding error: {0}")]
    Encoding(String),
}

impl TokenError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid TTL error.
    #[must_use]
    pub fn invalid_ttl(msg: impl Into<String>) -> Self {
        Self::InvalidTtl(msg.into())
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

/// Reasons a presented token is rejected.
///
/// Variants are ordered the way verification evaluates them: a token that
/// fails several checks reports the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// Token structure, encoding, header or claims are invalid
    #[error("Token malformed: {reason}")]
    Malformed {
        /// Description of the malformation
        reason: String,
    },

    /// Header declares an algorithm this verifier does not accept
    #[error("Unsupported token algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// Algorithm named in the token header
        algorithm: String,
    },

    /// Signature does not match the header and payload
    #[error("Token signature invalid")]
    InvalidSignature,

    /// Signature is valid but the token is past its expiry
    #[error("Token expired at {expired_at}")]
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
}

impl VerifyError {
    /// Create a malformed-token error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Stable code for this failure, used in metrics labels and logs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "TOKEN_MALFORMED",
            Self::UnsupportedAlgorithm { .. } => "TOKEN_UNSUPPORTED_ALGORITHM",
            Self::InvalidSignature => "TOKEN_INVALID_SIGNATURE",
            Self::Expired { .. } => "TOKEN_EXPIRED",
        }
    }

    /// Whether the failure is an expiry rather than an invalid token.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}
