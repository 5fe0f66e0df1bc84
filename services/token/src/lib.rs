//! Bearer token service library.
//!
//! Issues and verifies HS256-signed, time-limited bearer tokens with a
//! single in-memory key generated at process start.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod boundary;
pub mod config;
pub mod error;
pub mod jwt;
pub mod metrics;
pub mod observability;

// Re-exports for convenience
pub use config::{Config, JwtAlgorithm};
pub use error::{TokenError, VerifyError};
pub use jwt::{Claims, KeyMaterial, Token, TokenCodec};
