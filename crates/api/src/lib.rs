//! `mercora-api` — HTTP surface for the storefront.
//!
//! Thin handlers over the domain crates: routes parse and authorize, the
//! [`app::services`] layer orchestrates aggregates against the store, and
//! every response goes out as JSON. Auth is bearer-token only; the two
//! catalog reads and `/health` are the only public routes.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
