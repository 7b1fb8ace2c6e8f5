//! JSON API handlers. Every response uses the `{success, data, message}`
//! envelope.

pub mod auth;
pub mod events;
pub mod reviews;
pub mod rsvps;
