//! PostgreSQL adapters - Database implementations for subscriber ports.

mod subscriber_store;

pub use subscriber_store::PostgresSubscriberStore;
