//! `gatewarden-core` — shared authentication/authorization primitives.
//!
//! This crate contains **pure** value objects and the error taxonomy; it is
//! intentionally decoupled from HTTP, crypto and storage.

pub mod authority;
pub mod error;
pub mod id;
pub mod subject;

pub use authority::Authority;
pub use error::{AuthError, AuthResult};
pub use id::TokenId;
pub use subject::Subject;
