//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (timestamps, IDs, errors, auth types)
//! - `access` - Subscriber records, access decisions and payment events

pub mod access;
pub mod foundation;
