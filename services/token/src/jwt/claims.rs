use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload carried by a bearer token.
///
/// Field order is the wire order: `sub` then `exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject identity, opaque to this service
    pub sub: String,
    /// Expiry as unix seconds
    pub exp: i64,
}

impl Claims {
    /// Claims for `subject` expiring at unix second `expires_at`.
    pub fn new(subject: impl Into<String>, expires_at: i64) -> Self {
        Claims {
            sub: subject.into(),
            exp: expires_at,
        }
    }

    /// Expiry as a UTC timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Expiry is exclusive: a token is no longer valid at `exp` itself.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}
