//! Glue between the token codec and an HTTP layer.
//!
//! Extracts bearer credentials from an `Authorization` header and collapses
//! every verification failure into a uniform 401 rejection. Clients only
//! learn whether a token was expired or invalid.

use crate::error::VerifyError;
use crate::jwt::{Token, TokenCodec};
use serde::Serialize;

/// HTTP status used for every rejection.
pub const UNAUTHORIZED: u16 = 401;

const BEARER_SCHEME: &str = "bearer";

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively. Returns `None` for other
/// schemes or an empty credential.
#[must_use]
pub fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, credential) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }

    let credential = credential.trim();
    (!credential.is_empty()).then_some(credential)
}

/// Client-facing rejection of an unauthenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// HTTP status code
    #[serde(skip)]
    pub status: u16,
    /// Generic message, safe to return to the client
    pub detail: &'static str,
    #[serde(skip)]
    error: &'static str,
}

impl Rejection {
    /// Map a verification failure to its client-facing form.
    #[must_use]
    pub fn from_error(error: &VerifyError) -> Self {
        if error.is_expired() {
            Self {
                status: UNAUTHORIZED,
                detail: "Token expired",
                error: "invalid_token",
            }
        } else {
            Self {
                status: UNAUTHORIZED,
                detail: "Invalid token",
                error: "invalid_token",
            }
        }
    }

    /// Rejection for a request with no usable bearer credential.
    #[must_use]
    pub const fn missing_credentials() -> Self {
        Self {
            status: UNAUTHORIZED,
            detail: "Not authenticated",
            error: "",
        }
    }

    /// `WWW-Authenticate` challenge per RFC 6750.
    #[must_use]
    pub fn www_authenticate(&self) -> String {
        if self.error.is_empty() {
            "Bearer".to_string()
        } else {
            format!(
                "Bearer error=\"{}\", error_description=\"{}\"",
                self.error, self.detail
            )
        }
    }
}

impl From<VerifyError> for Rejection {
    fn from(error: VerifyError) -> Self {
        Self::from_error(&error)
    }
}

/// Authenticate a request from its `Authorization` header value.
///
/// # Errors
///
/// Returns a [`Rejection`] when the header is absent or unusable, or when
/// the token fails verification.
pub fn authenticate(codec: &TokenCodec, authorization: Option<&str>) -> Result<String, Rejection> {
    let token = authorization
        .and_then(bearer_token)
        .ok_or_else(Rejection::missing_credentials)?;

    Ok(codec.verify(token)?)
}

/// Response body returned by a login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessTokenResponse {
    /// The issued bearer token
    pub access_token: String,
    /// Always `bearer`
    pub token_type: &'static str,
}

impl From<Token> for AccessTokenResponse {
    fn from(token: Token) -> Self {
        Self {
            access_token: token.into_string(),
            token_type: "bearer",
        }
    }
}
