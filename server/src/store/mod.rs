//! Persistence boundary.
//!
//! [`EventStore`] is implemented by [`PgStore`] for production and by
//! [`MemoryStore`] for tests and local experiments.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    AttendeeRsvp, Event, EventInput, EventListing, NewProfile, NewUser, Review, ReviewWithAuthor,
    Rsvp, RsvpStatus, User, UserProfile, UserRsvp,
};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Filter options for listing events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restricts the result to events this user may see; `None` means public only.
    pub viewer: Option<Uuid>,
    /// Case-insensitive match against title, description or location.
    pub search: Option<String>,
    /// Case-insensitive match against location.
    pub location: Option<String>,
    pub organizer: Option<Uuid>,
    pub limit: u32,
    pub offset: u32,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    // =========================================================================
    // Users
    // =========================================================================

    /// Creates a user together with their profile. Fails with
    /// [`StoreError::Conflict`] when the username is taken.
    async fn create_user(&self, user: NewUser, profile: NewProfile) -> StoreResult<User>;

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;

    /// Inserts or replaces the profile of `profile.user_id`.
    async fn save_profile(&self, profile: UserProfile) -> StoreResult<UserProfile>;

    // =========================================================================
    // Events
    // =========================================================================

    async fn create_event(&self, organizer_id: Uuid, input: EventInput) -> StoreResult<Event>;

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>>;

    async fn update_event(&self, id: Uuid, input: EventInput) -> StoreResult<Event>;

    async fn delete_event(&self, id: Uuid) -> StoreResult<()>;

    /// Lists events matching `filter`, ordered by start time, along with the
    /// total number of matches ignoring limit and offset.
    async fn list_events(&self, filter: &EventFilter) -> StoreResult<(Vec<EventListing>, u64)>;

    async fn count_rsvps(&self, event_id: Uuid) -> StoreResult<i64>;

    /// Users organizing at least one event visible to `viewer`.
    async fn list_organizers(&self, viewer: Option<Uuid>) -> StoreResult<Vec<User>>;

    /// Events organized by a user, newest first.
    async fn list_organized_events(&self, organizer_id: Uuid) -> StoreResult<Vec<Event>>;

    /// Events starting in `(now, until]` that have not been reminded yet.
    async fn events_needing_reminder(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>>;

    async fn mark_reminder_sent(&self, event_id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;

    // =========================================================================
    // RSVPs
    // =========================================================================

    async fn find_rsvp(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Rsvp>>;

    async fn get_rsvp(&self, id: Uuid) -> StoreResult<Option<Rsvp>>;

    /// Creates the RSVP for (event, user) or updates its status in place.
    async fn upsert_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> StoreResult<Rsvp>;

    async fn update_rsvp_status(&self, id: Uuid, status: RsvpStatus) -> StoreResult<Rsvp>;

    async fn delete_rsvp(&self, id: Uuid) -> StoreResult<()>;

    /// RSVPs on an event, oldest first.
    async fn list_event_rsvps(&self, event_id: Uuid) -> StoreResult<Vec<AttendeeRsvp>>;

    /// A user's RSVPs with their event titles, newest first.
    async fn list_user_rsvps(&self, user_id: Uuid) -> StoreResult<Vec<UserRsvp>>;

    /// E-mail addresses of users holding an RSVP on the event, optionally
    /// restricted to one status.
    async fn attendee_emails(
        &self,
        event_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> StoreResult<Vec<String>>;

    /// Distinct e-mail addresses of users who said "Going" to any event by
    /// this organizer.
    async fn past_attendee_emails(&self, organizer_id: Uuid) -> StoreResult<Vec<String>>;

    // =========================================================================
    // Reviews
    // =========================================================================

    async fn create_review(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        rating: i16,
        comment: String,
    ) -> StoreResult<Review>;

    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>>;

    async fn update_review(&self, id: Uuid, rating: i16, comment: String) -> StoreResult<Review>;

    async fn delete_review(&self, id: Uuid) -> StoreResult<()>;

    /// Reviews of an event, newest first.
    async fn list_event_reviews(&self, event_id: Uuid) -> StoreResult<Vec<ReviewWithAuthor>>;

    async fn list_user_reviews(&self, user_id: Uuid) -> StoreResult<Vec<Review>>;
}
