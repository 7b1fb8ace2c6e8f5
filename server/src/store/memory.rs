use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::access::{can_view, Viewer};
use crate::models::{
    AttendeeRsvp, Event, EventInput, EventListing, NewProfile, NewUser, Review, ReviewWithAuthor,
    Rsvp, RsvpStatus, User, UserProfile, UserRsvp,
};

use super::{EventFilter, EventStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, UserProfile>,
    events: HashMap<Uuid, Event>,
    rsvps: HashMap<Uuid, Rsvp>,
    reviews: HashMap<Uuid, Review>,
}

impl State {
    fn rsvp_for(&self, event_id: Uuid, user_id: Uuid) -> Option<&Rsvp> {
        self.rsvps
            .values()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
    }

    fn viewer(&self, event: &Event, user_id: Option<Uuid>) -> Viewer {
        match user_id {
            None => Viewer::Anonymous,
            Some(id) => Viewer::User {
                id,
                has_rsvp: self.rsvp_for(event.id, id).is_some(),
            },
        }
    }

    fn rsvp_count(&self, event_id: Uuid) -> i64 {
        self.rsvps.values().filter(|r| r.event_id == event_id).count() as i64
    }

    fn username(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn emails<'a>(&self, user_ids: impl Iterator<Item = &'a Uuid>) -> Vec<String> {
        let mut seen = HashSet::new();
        user_ids
            .filter_map(|id| self.users.get(id))
            .map(|u| u.email.clone())
            .filter(|email| seen.insert(email.clone()))
            .collect()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// In-memory store used by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_user(&self, user: NewUser, profile: NewProfile) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        let profile = UserProfile {
            user_id: user.id,
            full_name: profile.full_name,
            bio: profile.bio,
            location: profile.location,
            profile_picture: profile.profile_picture,
            created_at: now,
            updated_at: now,
        };
        state.profiles.insert(user.id, profile);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.state.read().await.profiles.get(&user_id).cloned())
    }

    async fn save_profile(&self, mut profile: UserProfile) -> StoreResult<UserProfile> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&profile.user_id) {
            return Err(StoreError::not_found("User"));
        }
        profile.updated_at = Utc::now();
        if let Some(existing) = state.profiles.get(&profile.user_id) {
            profile.created_at = existing.created_at;
        }
        state.profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn create_event(&self, organizer_id: Uuid, input: EventInput) -> StoreResult<Event> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&organizer_id) {
            return Err(StoreError::not_found("User"));
        }

        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            organizer_id,
            title: input.title,
            description: input.description,
            location: input.location,
            start_time: input.start_time,
            end_time: input.end_time,
            is_public: input.is_public,
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        };
        state.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.state.read().await.events.get(&id).cloned())
    }

    async fn update_event(&self, id: Uuid, input: EventInput) -> StoreResult<Event> {
        let mut state = self.state.write().await;
        let event = state
            .events
            .get_mut(&id)
            .ok_or(StoreError::not_found("Event"))?;

        event.title = input.title;
        event.description = input.description;
        event.location = input.location;
        event.start_time = input.start_time;
        event.end_time = input.end_time;
        event.is_public = input.is_public;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.events.remove(&id).is_none() {
            return Err(StoreError::not_found("Event"));
        }
        state.rsvps.retain(|_, r| r.event_id != id);
        state.reviews.retain(|_, r| r.event_id != id);
        Ok(())
    }

    async fn list_events(&self, filter: &EventFilter) -> StoreResult<(Vec<EventListing>, u64)> {
        let state = self.state.read().await;
        let mut matches: Vec<&Event> = state
            .events
            .values()
            .filter(|e| can_view(e, &state.viewer(e, filter.viewer)))
            .filter(|e| {
                filter.search.as_deref().map_or(true, |q| {
                    contains_ci(&e.title, q)
                        || contains_ci(&e.description, q)
                        || contains_ci(&e.location, q)
                })
            })
            .filter(|e| {
                filter
                    .location
                    .as_deref()
                    .map_or(true, |l| contains_ci(&e.location, l))
            })
            .filter(|e| filter.organizer.map_or(true, |o| e.organizer_id == o))
            .collect();
        matches.sort_by_key(|e| (e.start_time, e.id));

        let total = matches.len() as u64;
        let limit = if filter.limit == 0 {
            usize::MAX
        } else {
            filter.limit as usize
        };
        let page = matches
            .into_iter()
            .skip(filter.offset as usize)
            .take(limit)
            .map(|e| EventListing {
                event: e.clone(),
                rsvp_count: state.rsvp_count(e.id),
            })
            .collect();

        Ok((page, total))
    }

    async fn count_rsvps(&self, event_id: Uuid) -> StoreResult<i64> {
        Ok(self.state.read().await.rsvp_count(event_id))
    }

    async fn list_organizers(&self, viewer: Option<Uuid>) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        let organizer_ids: HashSet<Uuid> = state
            .events
            .values()
            .filter(|e| can_view(e, &state.viewer(e, viewer)))
            .map(|e| e.organizer_id)
            .collect();

        let mut organizers: Vec<User> = organizer_ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect();
        organizers.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(organizers)
    }

    async fn list_organized_events(&self, organizer_id: Uuid) -> StoreResult<Vec<Event>> {
        let state = self.state.read().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.organizer_id == organizer_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn events_needing_reminder(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        let state = self.state.read().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.reminder_sent_at.is_none() && e.start_time > now && e.start_time <= until)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start_time);
        Ok(events)
    }

    async fn mark_reminder_sent(&self, event_id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let event = state
            .events
            .get_mut(&event_id)
            .ok_or(StoreError::not_found("Event"))?;
        event.reminder_sent_at = Some(at);
        Ok(())
    }

    async fn find_rsvp(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Rsvp>> {
        let state = self.state.read().await;
        Ok(state.rsvp_for(event_id, user_id).cloned())
    }

    async fn get_rsvp(&self, id: Uuid) -> StoreResult<Option<Rsvp>> {
        Ok(self.state.read().await.rsvps.get(&id).cloned())
    }

    async fn upsert_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> StoreResult<Rsvp> {
        let mut state = self.state.write().await;
        if !state.events.contains_key(&event_id) {
            return Err(StoreError::not_found("Event"));
        }

        let now = Utc::now();
        if let Some(id) = state.rsvp_for(event_id, user_id).map(|r| r.id) {
            let rsvp = state
                .rsvps
                .get_mut(&id)
                .ok_or(StoreError::not_found("RSVP"))?;
            if rsvp.status != status {
                rsvp.status = status;
                rsvp.updated_at = now;
            }
            return Ok(rsvp.clone());
        }

        let rsvp = Rsvp {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            status,
            created_at: now,
            updated_at: now,
        };
        state.rsvps.insert(rsvp.id, rsvp.clone());
        Ok(rsvp)
    }

    async fn update_rsvp_status(&self, id: Uuid, status: RsvpStatus) -> StoreResult<Rsvp> {
        let mut state = self.state.write().await;
        let rsvp = state
            .rsvps
            .get_mut(&id)
            .ok_or(StoreError::not_found("RSVP"))?;
        rsvp.status = status;
        rsvp.updated_at = Utc::now();
        Ok(rsvp.clone())
    }

    async fn delete_rsvp(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .rsvps
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::not_found("RSVP"))
    }

    async fn list_event_rsvps(&self, event_id: Uuid) -> StoreResult<Vec<AttendeeRsvp>> {
        let state = self.state.read().await;
        let mut rsvps: Vec<AttendeeRsvp> = state
            .rsvps
            .values()
            .filter(|r| r.event_id == event_id)
            .map(|r| AttendeeRsvp {
                rsvp: r.clone(),
                username: state.username(r.user_id),
            })
            .collect();
        rsvps.sort_by_key(|a| a.rsvp.created_at);
        Ok(rsvps)
    }

    async fn list_user_rsvps(&self, user_id: Uuid) -> StoreResult<Vec<UserRsvp>> {
        let state = self.state.read().await;
        let mut rsvps: Vec<UserRsvp> = state
            .rsvps
            .values()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                state.events.get(&r.event_id).map(|e| UserRsvp {
                    rsvp: r.clone(),
                    event_title: e.title.clone(),
                    event_start_time: e.start_time,
                })
            })
            .collect();
        rsvps.sort_by(|a, b| b.rsvp.created_at.cmp(&a.rsvp.created_at));
        Ok(rsvps)
    }

    async fn attendee_emails(
        &self,
        event_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> StoreResult<Vec<String>> {
        let state = self.state.read().await;
        let mut rsvps: Vec<&Rsvp> = state
            .rsvps
            .values()
            .filter(|r| r.event_id == event_id && status.map_or(true, |s| r.status == s))
            .collect();
        rsvps.sort_by_key(|r| r.created_at);
        Ok(state.emails(rsvps.iter().map(|r| &r.user_id)))
    }

    async fn past_attendee_emails(&self, organizer_id: Uuid) -> StoreResult<Vec<String>> {
        let state = self.state.read().await;
        let mut rsvps: Vec<&Rsvp> = state
            .rsvps
            .values()
            .filter(|r| r.status == RsvpStatus::Going)
            .filter(|r| {
                state
                    .events
                    .get(&r.event_id)
                    .is_some_and(|e| e.organizer_id == organizer_id)
            })
            .collect();
        rsvps.sort_by_key(|r| r.created_at);
        Ok(state.emails(rsvps.iter().map(|r| &r.user_id)))
    }

    async fn create_review(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        rating: i16,
        comment: String,
    ) -> StoreResult<Review> {
        let mut state = self.state.write().await;
        if !state.events.contains_key(&event_id) {
            return Err(StoreError::not_found("Event"));
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            rating,
            comment,
            created_at: now,
            updated_at: now,
        };
        state.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self.state.read().await.reviews.get(&id).cloned())
    }

    async fn update_review(&self, id: Uuid, rating: i16, comment: String) -> StoreResult<Review> {
        let mut state = self.state.write().await;
        let review = state
            .reviews
            .get_mut(&id)
            .ok_or(StoreError::not_found("Review"))?;
        review.rating = rating;
        review.comment = comment;
        review.updated_at = Utc::now();
        Ok(review.clone())
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::not_found("Review"))
    }

    async fn list_event_reviews(&self, event_id: Uuid) -> StoreResult<Vec<ReviewWithAuthor>> {
        let state = self.state.read().await;
        let mut reviews: Vec<ReviewWithAuthor> = state
            .reviews
            .values()
            .filter(|r| r.event_id == event_id)
            .map(|r| ReviewWithAuthor {
                review: r.clone(),
                username: state.username(r.user_id),
            })
            .collect();
        reviews.sort_by(|a, b| b.review.created_at.cmp(&a.review.created_at));
        Ok(reviews)
    }

    async fn list_user_reviews(&self, user_id: Uuid) -> StoreResult<Vec<Review>> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn user(store: &MemoryStore, username: &str) -> User {
        store
            .create_user(
                NewUser {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    password_hash: "hash".to_string(),
                },
                NewProfile {
                    full_name: username.to_string(),
                    ..NewProfile::default()
                },
            )
            .await
            .unwrap()
    }

    fn input(title: &str, is_public: bool, starts_in: Duration) -> EventInput {
        let start = Utc::now() + starts_in;
        EventInput {
            title: title.to_string(),
            description: String::new(),
            location: "Town Hall".to_string(),
            start_time: start,
            end_time: start + Duration::hours(2),
            is_public,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        user(&store, "jane").await;

        let err = store
            .create_user(
                NewUser {
                    username: "jane".to_string(),
                    email: "other@example.com".to_string(),
                    password_hash: "hash".to_string(),
                },
                NewProfile::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_upsert_rsvp_keeps_single_row() {
        let store = MemoryStore::new();
        let organizer = user(&store, "organizer").await;
        let guest = user(&store, "guest").await;
        let event = store
            .create_event(organizer.id, input("Meetup", true, Duration::days(1)))
            .await
            .unwrap();

        let first = store
            .upsert_rsvp(event.id, guest.id, RsvpStatus::Going)
            .await
            .unwrap();
        let second = store
            .upsert_rsvp(event.id, guest.id, RsvpStatus::Going)
            .await
            .unwrap();
        let third = store
            .upsert_rsvp(event.id, guest.id, RsvpStatus::Maybe)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.id, third.id);
        assert_eq!(third.status, RsvpStatus::Maybe);
        assert_eq!(store.count_rsvps(event.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_events_applies_visibility_and_filters() {
        let store = MemoryStore::new();
        let organizer = user(&store, "organizer").await;
        let guest = user(&store, "guest").await;
        let stranger = user(&store, "stranger").await;

        store
            .create_event(organizer.id, input("Public Picnic", true, Duration::days(2)))
            .await
            .unwrap();
        let private = store
            .create_event(organizer.id, input("Private Dinner", false, Duration::days(1)))
            .await
            .unwrap();
        store
            .upsert_rsvp(private.id, guest.id, RsvpStatus::Maybe)
            .await
            .unwrap();

        let anonymous = EventFilter::default();
        let (events, total) = store.list_events(&anonymous).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(events[0].event.title, "Public Picnic");

        let for_stranger = EventFilter {
            viewer: Some(stranger.id),
            ..EventFilter::default()
        };
        assert_eq!(store.list_events(&for_stranger).await.unwrap().1, 1);

        let for_guest = EventFilter {
            viewer: Some(guest.id),
            ..EventFilter::default()
        };
        let (events, total) = store.list_events(&for_guest).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(events[0].event.title, "Private Dinner");
        assert_eq!(events[0].rsvp_count, 1);

        let search = EventFilter {
            viewer: Some(organizer.id),
            search: Some("picnic".to_string()),
            ..EventFilter::default()
        };
        let (events, _) = store.list_events(&search).await.unwrap();
        assert_eq!(events.len(), 1);

        let paged = EventFilter {
            viewer: Some(organizer.id),
            limit: 1,
            offset: 1,
            ..EventFilter::default()
        };
        let (events, total) = store.list_events(&paged).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(events[0].event.title, "Public Picnic");
    }

    #[tokio::test]
    async fn test_delete_event_removes_dependents() {
        let store = MemoryStore::new();
        let organizer = user(&store, "organizer").await;
        let guest = user(&store, "guest").await;
        let event = store
            .create_event(organizer.id, input("Meetup", true, Duration::days(1)))
            .await
            .unwrap();
        store
            .upsert_rsvp(event.id, guest.id, RsvpStatus::Going)
            .await
            .unwrap();
        store
            .create_review(event.id, guest.id, 5, "Loved it".to_string())
            .await
            .unwrap();

        store.delete_event(event.id).await.unwrap();

        assert!(store.list_user_rsvps(guest.id).await.unwrap().is_empty());
        assert!(store.list_user_reviews(guest.id).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_event(event.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_reminder_window() {
        let store = MemoryStore::new();
        let organizer = user(&store, "organizer").await;
        let soon = store
            .create_event(organizer.id, input("Soon", true, Duration::hours(3)))
            .await
            .unwrap();
        store
            .create_event(organizer.id, input("Later", true, Duration::days(3)))
            .await
            .unwrap();

        let now = Utc::now();
        let due = store
            .events_needing_reminder(now, now + Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, soon.id);

        store.mark_reminder_sent(soon.id, now).await.unwrap();
        let due = store
            .events_needing_reminder(now, now + Duration::hours(24))
            .await
            .unwrap();
        assert!(due.is_empty());
    }
}
