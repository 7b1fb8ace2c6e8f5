use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::user::PublicUser;
use super::validation::{error, validate_not_blank};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_public: bool,
    #[serde(skip_serializing)]
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now
    }
}

/// An event row together with its RSVP count, as produced by listings.
#[derive(Debug, Clone, FromRow)]
pub struct EventListing {
    #[sqlx(flatten)]
    pub event: Event,
    pub rsvp_count: i64,
}

fn default_public() -> bool {
    true
}

/// Writable fields of an event. Every create and update passes through here.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[validate(schema(function = "validate_schedule"))]
pub struct EventInput {
    #[validate(
        length(max = 200, message = "Ensure this field has at most 200 characters."),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(
        length(max = 255, message = "Ensure this field has at most 255 characters."),
        custom(function = "validate_not_blank")
    )]
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn validate_schedule(input: &EventInput) -> Result<(), ValidationError> {
    if input.end_time <= input.start_time {
        return Err(error("schedule", "End time must be after start time."));
    }
    Ok(())
}

impl EventInput {
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            is_public: event.is_public,
        }
    }

    /// Overlays the fields present in `patch`.
    pub fn merge(mut self, patch: EventPatch) -> Self {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = end_time;
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub organizer: PublicUser,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub rsvp_count: i64,
}

impl EventView {
    pub fn new(event: Event, organizer: PublicUser, rsvp_count: i64) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            organizer,
            location: event.location,
            start_time: event.start_time,
            end_time: event.end_time,
            is_public: event.is_public,
            created_at: event.created_at,
            updated_at: event.updated_at,
            rsvp_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validation::NON_FIELD_ERRORS;
    use chrono::Duration;

    fn input() -> EventInput {
        let start = Utc::now() + Duration::days(1);
        EventInput {
            title: "Test Event".to_string(),
            description: "Test Description".to_string(),
            location: "Test Location".to_string(),
            start_time: start,
            end_time: start + Duration::hours(2),
            is_public: true,
        }
    }

    #[test]
    fn test_valid_event_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_end_time_must_follow_start_time() {
        let mut event = input();
        event.end_time = event.start_time;

        let errors = event.validate().unwrap_err();
        assert!(errors.errors().contains_key(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_blank_location_is_a_field_error() {
        let mut event = input();
        event.location = "  ".to_string();

        let errors = event.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("location"));
    }

    #[test]
    fn test_is_public_defaults_to_true() {
        let json = serde_json::json!({
            "title": "New Event",
            "location": "New Location",
            "start_time": "2030-01-01T10:00:00Z",
            "end_time": "2030-01-01T12:00:00Z",
        });
        let event: EventInput = serde_json::from_value(json).unwrap();
        assert!(event.is_public);
        assert!(event.description.is_empty());
    }

    #[test]
    fn test_merge_only_touches_present_fields() {
        let base = input();
        let merged = base.clone().merge(EventPatch {
            title: Some("Updated Event Title".to_string()),
            ..EventPatch::default()
        });

        assert_eq!(merged.title, "Updated Event Title");
        assert_eq!(merged.location, base.location);
        assert_eq!(merged.start_time, base.start_time);
    }
}
