//! Compact JWS segment encoding.
//!
//! Header and payload are compact JSON in declaration order, each segment is
//! unpadded base64url.

use crate::error::{TokenError, VerifyError};
use crate::jwt::claims::Claims;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token type declared in every header.
pub const TOKEN_TYPE: &str = "JWT";

/// JOSE header. Serialized as `{"alg":..,"typ":..}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Header {
    pub(crate) fn new(alg: &str) -> Self {
        Header {
            alg: alg.to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        }
    }
}

/// The three raw segments of a compact token, already base64url-decoded.
///
/// `signing_input` borrows the received `header.payload` text unchanged;
/// the MAC is always checked over the bytes as presented.
#[derive(Debug)]
pub(crate) struct Segments<'a> {
    pub signing_input: &'a str,
    pub header: Vec<u8>,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

pub(crate) struct JwtSerializer;

impl JwtSerializer {
    /// Encode header and claims into `header_b64.payload_b64`.
    pub fn signing_input(header: &Header, claims: &Claims) -> Result<String, TokenError> {
        let header_json = serde_json::to_vec(header)?;
        let payload_json = serde_json::to_vec(claims)?;

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(payload_json)
        ))
    }

    /// Append the encoded signature to a signing input.
    pub fn assemble(signing_input: &str, signature: &[u8]) -> String {
        format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
    }

    /// Split a compact token into exactly three non-empty base64url segments.
    pub fn split(token: &str) -> Result<Segments<'_>, VerifyError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(VerifyError::malformed(format!(
                "expected 3 segments, found {}",
                parts.len()
            )));
        }

        let header = decode_segment(parts[0], "header")?;
        let payload = decode_segment(parts[1], "payload")?;
        let signature = decode_segment(parts[2], "signature")?;

        // parts[0] and parts[1] are non-empty, so this slice is in bounds
        let signing_input = &token[..parts[0].len() + 1 + parts[1].len()];

        Ok(Segments {
            signing_input,
            header,
            payload,
            signature,
        })
    }

    /// Parse a header. Critical extensions are never understood here.
    pub fn decode_header(bytes: &[u8]) -> Result<Header, VerifyError> {
        let object = decode_object(bytes, "header")?;
        if object.contains_key("crit") {
            return Err(VerifyError::malformed("unsupported critical header"));
        }

        from_object(object, "header")
    }

    pub fn decode_claims(bytes: &[u8]) -> Result<Claims, VerifyError> {
        let claims: Claims = from_object(decode_object(bytes, "claims")?, "claims")?;

        if claims.sub.is_empty() {
            return Err(VerifyError::malformed("empty subject"));
        }

        Ok(claims)
    }
}

/// JOSE headers and claim sets must be JSON objects, never arrays.
fn decode_object(bytes: &[u8], name: &str) -> Result<Map<String, Value>, VerifyError> {
    serde_json::from_slice(bytes)
        .map_err(|e| VerifyError::malformed(format!("{name} is not a JSON object: {e}")))
}

fn from_object<T: DeserializeOwned>(object: Map<String, Value>, name: &str) -> Result<T, VerifyError> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| VerifyError::malformed(format!("invalid {name}: {e}")))
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, VerifyError> {
    if segment.is_empty() {
        return Err(VerifyError::malformed(format!("empty {name} segment")));
    }

    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| VerifyError::malformed(format!("invalid {name} encoding: {e}")))
}
