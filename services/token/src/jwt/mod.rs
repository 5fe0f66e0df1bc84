//! HS256 bearer tokens: claims, key material and the issuing/verifying codec.

pub mod claims;
pub mod codec;
pub mod key;
pub(crate) mod serializer;

pub use claims::Claims;
pub use codec::{Token, TokenCodec, DEFAULT_TTL};
pub use key::{KeyMaterial, SECRET_LEN};
