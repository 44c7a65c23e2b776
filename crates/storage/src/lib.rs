//! `mercora-storage` — persistence for the storefront domain.
//!
//! Two interchangeable backends sit behind the store traits:
//!
//! - [`MemoryStore`] for tests and local development (no external services)
//! - [`PostgresStore`] for production, with embedded sqlx migrations
//!
//! The domain crates stay IO-free; everything that touches a database or a
//! lock lives here. The two multi-entity writes (wholesale approval, order
//! placement) are atomic in both backends: a single mutex guard in memory, a
//! transaction in Postgres.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use traits::{AccountStore, ApplicationStore, CartStore, OrderStore, ProductStore, Store};
