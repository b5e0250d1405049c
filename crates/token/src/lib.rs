//! `gatewarden-token` — self-contained signed credentials.
//!
//! Issues and verifies stateless bearer tokens: a signed claims payload is
//! the entire server-side record. Validity is re-derivable from the token's
//! own bytes plus the current key ring and clock; the server keeps no
//! per-session state.

pub mod claims;
pub mod codec;
pub mod issuer;
pub mod keys;
pub mod revocation;
pub mod validator;

pub use claims::Claims;
pub use codec::{SignedToken, TokenCodec};
pub use issuer::TokenIssuer;
pub use keys::{KeyRing, KeyRingHandle, SigningKey};
pub use revocation::RevocationSet;
pub use validator::TokenValidator;
