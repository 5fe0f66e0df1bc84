//! Process-wide HMAC signing key.
//!
//! The secret is generated once at startup from the OS CSPRNG and never
//! leaves this type: no serialization, redacted `Debug`, zeroed on drop.

use crate::config::JwtAlgorithm;
use crate::error::TokenError;
use rand::rngs::OsRng;
use rand::RngCore;
use ring::hmac;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of generated secrets, and the minimum accepted for injected ones.
pub const SECRET_LEN: usize = 32;

#[derive(Zeroize, ZeroizeOnDrop)]
struct Secret(Vec<u8>);

/// Immutable signing key and the algorithm it is used with.
pub struct KeyMaterial {
    secret: Secret,
    algorithm: JwtAlgorithm,
}

impl KeyMaterial {
    /// Generate a fresh random secret.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyGeneration`] if the OS random source fails.
    pub fn generate() -> Result<Self, TokenError> {
        let mut bytes = vec![0u8; SECRET_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| TokenError::KeyGeneration(e.to_string()))?;

        tracing::info!(
            algorithm = JwtAlgorithm::HS256.as_str(),
            key_len = SECRET_LEN,
            "Generated signing key"
        );

        Ok(Self {
            secret: Secret(bytes),
            algorithm: JwtAlgorithm::HS256,
        })
    }

    /// Build key material from a caller-supplied secret.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::WeakSecret`] if the secret is shorter than
    /// [`SECRET_LEN`].
    pub fn from_secret(secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let secret = Secret(secret.into());
        if secret.0.len() < SECRET_LEN {
            return Err(TokenError::WeakSecret {
                actual: secret.0.len(),
                minimum: SECRET_LEN,
            });
        }

        Ok(Self {
            secret,
            algorithm: JwtAlgorithm::HS256,
        })
    }

    /// Algorithm tokens signed with this key must declare.
    #[must_use]
    pub const fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    /// Compute the MAC of `data`.
    #[must_use]
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        hmac::sign(&self.hmac_key(), data).as_ref().to_vec()
    }

    /// Check `signature` against the MAC of `data` in constant time.
    #[must_use]
    pub fn verify_signature(&self, data: &[u8], signature: &[u8]) -> bool {
        let expected = hmac::sign(&self.hmac_key(), data);
        expected.as_ref().ct_eq(signature).into()
    }

    fn hmac_key(&self) -> hmac::Key {
        match self.algorithm {
            JwtAlgorithm::HS256 => hmac::Key::new(hmac::HMAC_SHA256, &self.secret.0),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}
