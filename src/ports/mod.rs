//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Subscriber Ports
//!
//! - `SubscriberReader` - Read side, the only port access resolution uses
//! - `SubscriberRepository` - Write side for provisioning, webhooks and admins
//!
//! ## Infrastructure Ports
//!
//! - `SessionValidator` - Bearer token validation
//! - `Clock` - Injected current instant

mod clock;
mod session_validator;
mod subscriber_reader;
mod subscriber_repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use session_validator::SessionValidator;
pub use subscriber_reader::{LookupError, SubscriberReader};
pub use subscriber_repository::SubscriberRepository;
