//! Frequency Gate - premium and trial access for a subscription app
//!
//! Answers one question for every session: may this user use the premium
//! content right now? Subscriptions come from payment webhooks and admins;
//! new users get a one-off trial on first sign-in.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
