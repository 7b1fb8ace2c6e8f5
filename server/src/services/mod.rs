//! Operations shared by the JSON API and the HTML pages.

pub mod accounts;
pub mod events;
pub mod reviews;
pub mod rsvps;
