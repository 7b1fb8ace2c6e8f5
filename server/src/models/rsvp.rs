use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use super::user::UserSummary;
use super::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RsvpStatus {
    Going,
    Maybe,
    #[serde(rename = "Not Going")]
    NotGoing,
}

impl RsvpStatus {
    pub const ALL: [RsvpStatus; 3] = [RsvpStatus::Going, RsvpStatus::Maybe, RsvpStatus::NotGoing];

    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Going => "Going",
            RsvpStatus::Maybe => "Maybe",
            RsvpStatus::NotGoing => "Not Going",
        }
    }

    /// Parses a submitted status, reporting failures against the `status` field.
    pub fn parse_field(value: &str) -> Result<Self, ValidationErrors> {
        value
            .parse()
            .map_err(|e: InvalidStatus| validation::single("status", "invalid_choice", e.to_string()))
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidStatus(pub String);

impl FromStr for RsvpStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RsvpStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

impl TryFrom<String> for RsvpStatus {
    type Error = InvalidStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Rsvp {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AttendeeRsvp {
    #[sqlx(flatten)]
    pub rsvp: Rsvp,
    pub username: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRsvp {
    #[sqlx(flatten)]
    pub rsvp: Rsvp,
    pub event_title: String,
    pub event_start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RsvpRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRsvpRequest {
    pub event: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsvpView {
    pub id: Uuid,
    pub event: Uuid,
    pub user: UserSummary,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
}

impl RsvpView {
    pub fn new(rsvp: Rsvp, user: UserSummary) -> Self {
        Self {
            id: rsvp.id,
            event: rsvp.event_id,
            user,
            status: rsvp.status,
            created_at: rsvp.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(RsvpStatus::NotGoing).unwrap(),
            serde_json::json!("Not Going")
        );
        assert_eq!("Not Going".parse::<RsvpStatus>().unwrap(), RsvpStatus::NotGoing);
        assert_eq!("Going".parse::<RsvpStatus>().unwrap(), RsvpStatus::Going);
    }

    #[test]
    fn test_unknown_status_is_a_field_error() {
        assert!("going".parse::<RsvpStatus>().is_err());

        let errors = RsvpStatus::parse_field("Perhaps").unwrap_err();
        let messages = validation::messages_for(&errors, "status");
        assert_eq!(messages, vec!["\"Perhaps\" is not a valid choice.".to_string()]);
    }
}
