//! `gatewarden-http` — HTTP transport for the token engine.
//!
//! Thin consumer of the core crates: the engine itself never touches HTTP.
//! This crate extracts the `Authorization` header, runs the request pipeline
//! as axum middleware, and maps rejections to stable outward status codes.

pub mod app;
pub mod credentials;
pub mod errors;
pub mod middleware;
