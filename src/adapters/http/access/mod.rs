//! HTTP adapter for access endpoints.
//!
//! - `GET /api/access` - Access status for the caller
//! - `POST /api/access/trial` - Provision the caller's trial
//! - `PUT /api/admin/subscribers/:user_id/subscription` - Admin grant/revoke
//! - `POST /api/webhooks/payments` - Payment provider events

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{
    AccessApiError, AccessAppState, AccessSettings, DecisionReply, FAIL_CLOSED_HEADER,
};
pub use routes::{access_routes, admin_routes, webhook_routes};
