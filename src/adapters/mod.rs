//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Session validation (HS256 JWT, mock)
//! - `http` - axum REST API
//! - `memory` - In-memory subscriber store for tests and local runs
//! - `postgres` - PostgreSQL subscriber store

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;

pub use auth::{JwtConfig, JwtSessionValidator, MockSessionValidator};
pub use http::{build_router, AccessAppState, AccessSettings, RouterOptions};
pub use memory::InMemorySubscriberStore;
pub use postgres::PostgresSubscriberStore;
