//! Bearer token issuance and verification.
//!
//! [`TokenCodec`] owns the process key and is shared read-only between
//! request handlers. Every operation is a pure function of the key, its
//! input and the current time; the `*_at` variants take the time explicitly.

use crate::config::{Config, JwtAlgorithm};
use crate::error::{TokenError, VerifyError};
use crate::jwt::claims::Claims;
use crate::jwt::key::KeyMaterial;
use crate::jwt::serializer::{Header, JwtSerializer, TOKEN_TYPE};
use crate::metrics;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Default token lifetime when the caller does not override it.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// A signed compact token. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// The compact `header.payload.signature` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token, returning its string form.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

/// Issues and verifies HS256 bearer tokens with a single key.
#[derive(Debug)]
pub struct TokenCodec {
    key: KeyMaterial,
    default_ttl: Duration,
}

impl TokenCodec {
    /// Create a codec using [`DEFAULT_TTL`].
    #[must_use]
    pub fn new(key: KeyMaterial) -> Self {
        Self {
            key,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Create a codec from service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Config`] if the configured algorithm does not
    /// match the key, or the configured TTL is unusable.
    pub fn from_config(config: &Config, key: KeyMaterial) -> Result<Self, TokenError> {
        if config.jwt_algorithm != key.algorithm() {
            return Err(TokenError::config(format!(
                "JWT_ALGORITHM {} does not match key algorithm {}",
                config.jwt_algorithm.as_str(),
                key.algorithm().as_str()
            )));
        }

        Self::new(key).with_default_ttl(config.token_ttl)
    }

    /// Override the default TTL used by [`TokenCodec::issue_default`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidTtl`] if `ttl` is shorter than a second.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Result<Self, TokenError> {
        ttl_seconds(ttl)?;
        self.default_ttl = ttl;
        Ok(self)
    }

    /// Default TTL applied by [`TokenCodec::issue_default`].
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Algorithm every issued token declares and every verified token must.
    #[must_use]
    pub const fn algorithm(&self) -> JwtAlgorithm {
        self.key.algorithm()
    }

    /// Issue a token for `subject` with the default TTL.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::issue_at`].
    pub fn issue_default(&self, subject: &str) -> Result<Token, TokenError> {
        self.issue_at(subject, self.default_ttl, Utc::now())
    }

    /// Issue a token for `subject` expiring `ttl` from now.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::issue_at`].
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<Token, TokenError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    /// Issue a token as of `now`.
    ///
    /// Identical `subject`, `ttl` and `now` (to the second) yield a
    /// byte-identical token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::EmptySubject`] for an empty subject and
    /// [`TokenError::InvalidTtl`] for a TTL under one second or one that
    /// overflows the expiry timestamp.
    pub fn issue_at(
        &self,
        subject: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        if subject.is_empty() {
            return Err(TokenError::EmptySubject);
        }

        let expires_at = now
            .timestamp()
            .checked_add(ttl_seconds(ttl)?)
            .ok_or_else(|| TokenError::invalid_ttl("expiry overflows timestamp range"))?;

        let claims = Claims::new(subject, expires_at);
        let header = Header::new(self.algorithm().as_str());

        let signing_input = JwtSerializer::signing_input(&header, &claims)?;
        let signature = self.key.sign(signing_input.as_bytes());

        metrics::record_token_issued(self.algorithm().as_str());

        Ok(Token(JwtSerializer::assemble(&signing_input, &signature)))
    }

    /// Verify `token` now and return its subject.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::verify_claims_at`].
    pub fn verify(&self, token: &str) -> Result<String, VerifyError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify `token` as of `now` and return its subject.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::verify_claims_at`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, VerifyError> {
        self.verify_claims_at(token, now).map(|claims| claims.sub)
    }

    /// Verify `token` as of `now` and return its claims.
    ///
    /// Checks run in a fixed order and the first failure is returned.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Malformed`] for bad structure, encoding, header or claims
    /// - [`VerifyError::UnsupportedAlgorithm`] if the header names another algorithm
    /// - [`VerifyError::InvalidSignature`] on MAC mismatch
    /// - [`VerifyError::Expired`] if `exp` is not after `now`
    pub fn verify_claims_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, VerifyError> {
        let result = self.check(token, now);

        match &result {
            Ok(_) => metrics::record_verification("success"),
            Err(e) => {
                tracing::debug!(error_code = e.code(), "Token verification failed");
                metrics::record_verification(e.code());
            }
        }

        result
    }

    fn check(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, VerifyError> {
        // 1. Structure: three non-empty base64url segments
        let segments = JwtSerializer::split(token)?;

        // 2. Algorithm: must equal the key's, never chosen by the header
        let header = JwtSerializer::decode_header(&segments.header)?;
        if let Some(typ) = header.typ.as_deref() {
            if typ != TOKEN_TYPE {
                return Err(VerifyError::malformed(format!("unexpected token type {typ}")));
            }
        }
        if header.alg != self.algorithm().as_str() {
            return Err(VerifyError::UnsupportedAlgorithm {
                algorithm: header.alg,
            });
        }

        // 3. Signature over the received bytes
        if !self
            .key
            .verify_signature(segments.signing_input.as_bytes(), &segments.signature)
        {
            return Err(VerifyError::InvalidSignature);
        }

        // 4. Claims
        let claims = JwtSerializer::decode_claims(&segments.payload)?;

        // 5. Expiry, exclusive. An expired exp beyond chrono's range lies in the far past
        if claims.is_expired_at(now) {
            return Err(VerifyError::Expired {
                expired_at: claims.expires_at().unwrap_or(DateTime::<Utc>::MIN_UTC),
            });
        }

        Ok(claims)
    }
}

fn ttl_seconds(ttl: Duration) -> Result<i64, TokenError> {
    if ttl.as_secs() == 0 {
        return Err(TokenError::invalid_ttl(format!(
            "TTL must be at least one second, got {ttl:?}"
        )));
    }

    i64::try_from(ttl.as_secs()).map_err(|_| TokenError::invalid_ttl("TTL too large"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn codec() -> TokenCodec {
        TokenCodec::new(
            KeyMaterial::from_secret(b"test-secret-key-for-testing-only-32b".to_vec()).unwrap(),
        )
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let token = codec.issue("alice", Duration::from_secs(60)).unwrap();
        assert_eq!(codec.verify(token.as_str()).unwrap(), "alice");
    }

    #[test]
    fn test_issue_default_uses_one_hour() {
        let codec = codec();
        assert_eq!(codec.default_ttl(), Duration::from_secs(3600));

        let token = codec.issue_default("alice").unwrap();
        let claims = codec.verify_claims_at(token.as_str(), Utc::now()).unwrap();
        let remaining = claims.exp - Utc::now().timestamp();
        assert!((3598..=3600).contains(&remaining));
    }

    #[test]
    fn test_issue_rejects_empty_subject() {
        let result = codec().issue("", Duration::from_secs(60));
        assert!(matches!(result, Err(TokenError::EmptySubject)));
    }

    #[test]
    fn test_issue_rejects_sub_second_ttl() {
        let codec = codec();
        assert!(matches!(
            codec.issue("alice", Duration::ZERO),
            Err(TokenError::InvalidTtl(_))
        ));
        assert!(matches!(
            codec.issue("alice", Duration::from_millis(999)),
            Err(TokenError::InvalidTtl(_))
        ));
    }

    #[test]
    fn test_issue_rejects_overflowing_ttl() {
        let result = codec().issue("alice", Duration::from_secs(u64::MAX));
        assert!(matches!(result, Err(TokenError::InvalidTtl(_))));
    }

    #[test]
    fn test_with_default_ttl_rejects_zero() {
        assert!(codec().with_default_ttl(Duration::ZERO).is_err());
    }

    #[test]
    fn test_issued_token_wire_form() {
        let token = codec()
            .issue_at("alice", Duration::from_secs(3600), t0())
            .unwrap();
        let parts: Vec<&str> = token.as_str().split('.').collect();

        let header = URL_SAFE_NO_PAD.decode(parts[0]).unwrap();
        let payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let signature = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();

        assert_eq!(header, br#"{"alg":"HS256","typ":"JWT"}"#);
        assert_eq!(payload, br#"{"sub":"alice","exp":1700003600}"#);
        assert_eq!(signature.len(), 32);
    }

    #[test]
    fn test_same_instant_same_token() {
        let codec = codec();
        let a = codec.issue_at("alice", Duration::from_secs(60), t0()).unwrap();
        let b = codec.issue_at("alice", Duration::from_secs(60), t0()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec();
        let token = codec.issue_at("alice", Duration::from_secs(60), t0()).unwrap();
        let exp = t0() + chrono::Duration::seconds(60);

        assert!(codec
            .verify_at(token.as_str(), exp - chrono::Duration::seconds(1))
            .is_ok());
        assert!(matches!(
            codec.verify_at(token.as_str(), exp),
            Err(VerifyError::Expired { expired_at }) if expired_at == exp
        ));
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let token = codec().issue("alice", Duration::from_secs(60)).unwrap();
        let other = TokenCodec::new(KeyMaterial::generate().unwrap());
        assert_eq!(
            other.verify(token.as_str()),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn test_algorithm_checked_before_signature() {
        let codec = codec();
        let token = codec.issue("alice", Duration::from_secs(60)).unwrap();
        let parts: Vec<&str> = token.as_str().split('.').collect();
        let forged_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512","typ":"JWT"}"#);
        let forged = format!("{}.{}.{}", forged_header, parts[1], parts[2]);

        assert_eq!(
            codec.verify(&forged),
            Err(VerifyError::UnsupportedAlgorithm {
                algorithm: "HS512".to_string()
            })
        );
    }

    #[test]
    fn test_unexpected_typ_is_malformed() {
        let codec = codec();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"at+jwt"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"alice","exp":9999999999}"#);
        let input = format!("{header}.{payload}");
        let token = JwtSerializer::assemble(&input, &codec.key.sign(input.as_bytes()));

        assert!(matches!(
            codec.verify(&token),
            Err(VerifyError::Malformed { .. })
        ));
    }

    #[test]
    fn test_header_without_typ_accepted() {
        let codec = codec();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"alice","exp":9999999999}"#);
        let input = format!("{header}.{payload}");
        let token = JwtSerializer::assemble(&input, &codec.key.sign(input.as_bytes()));

        assert_eq!(codec.verify(&token).unwrap(), "alice");
    }

    #[test]
    fn test_signed_but_malformed_claims() {
        let codec = codec();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"alice"}"#);
        let input = format!("{header}.{payload}");
        let token = JwtSerializer::assemble(&input, &codec.key.sign(input.as_bytes()));

        assert!(matches!(
            codec.verify(&token),
            Err(VerifyError::Malformed { .. })
        ));
    }

    fn signed(codec: &TokenCodec, header: &[u8], payload: &[u8]) -> String {
        let input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        JwtSerializer::assemble(&input, &codec.key.sign(input.as_bytes()))
    }

    #[test]
    fn test_signed_array_segments_are_malformed() {
        let codec = codec();
        let object_header = br#"{"alg":"HS256","typ":"JWT"}"#;
        let object_payload = br#"{"sub":"alice","exp":9999999999}"#;

        for (header, payload) in [
            (&br#"["HS256","JWT"]"#[..], &br#"["alice",9999999999]"#[..]),
            (&br#"["HS256","JWT"]"#[..], &object_payload[..]),
            (&object_header[..], &br#"["alice",9999999999]"#[..]),
        ] {
            let token = signed(&codec, header, payload);
            assert!(
                matches!(codec.verify(&token), Err(VerifyError::Malformed { .. })),
                "expected Malformed for {token}"
            );
        }
    }

    #[test]
    fn test_signed_crit_header_is_malformed() {
        let codec = codec();
        let token = signed(
            &codec,
            br#"{"alg":"HS256","typ":"JWT","crit":["x"],"x":true}"#,
            br#"{"sub":"alice","exp":9999999999}"#,
        );

        assert!(matches!(
            codec.verify(&token),
            Err(VerifyError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unrepresentable_expiry_reports_min_time() {
        let codec = codec();
        let payload = format!(r#"{{"sub":"alice","exp":{}}}"#, i64::MIN);
        let token = signed(&codec, br#"{"alg":"HS256","typ":"JWT"}"#, payload.as_bytes());

        assert_eq!(
            codec.verify_at(&token, t0()),
            Err(VerifyError::Expired {
                expired_at: DateTime::<Utc>::MIN_UTC
            })
        );
    }

    #[test]
    fn test_token_display() {
        let token = codec().issue_at("alice", Duration::from_secs(60), t0()).unwrap();
        assert_eq!(token.to_string(), token.as_str());
        assert_eq!(String::from(token.clone()), token.into_string());
    }
}
