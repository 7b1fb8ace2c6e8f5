//! Raw form submissions from the HTML pages and their conversion into the
//! request types shared with the API.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::models::validation::{error, single};
use crate::models::{Event, EventInput, ProfileUpdate, RegisterRequest, ReviewRequest, UserProfile};
use crate::templates::{datetime_input, FormErrors};

const INVALID_DATETIME: &str = "Enter a valid date/time.";

/// Parses the value of a `datetime-local` input, read as UTC.
pub fn parse_datetime_local(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    /// Checkbox; absent when unchecked.
    pub is_public: Option<String>,
}

impl Default for EventForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            location: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            is_public: Some("on".to_string()),
        }
    }
}

impl EventForm {
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start_time: datetime_input(event.start_time),
            end_time: datetime_input(event.end_time),
            is_public: event.is_public.then(|| "on".to_string()),
        }
    }

    pub fn is_public(&self) -> bool {
        self.is_public.is_some()
    }

    /// Converts the submission; only the date fields are checked here, the
    /// rest is left to `EventInput` validation.
    pub fn to_input(&self) -> Result<EventInput, ValidationErrors> {
        let start_time = parse_datetime_local(&self.start_time);
        let end_time = parse_datetime_local(&self.end_time);

        let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
            let mut errors = ValidationErrors::new();
            if start_time.is_none() {
                errors.add("start_time", error("invalid", INVALID_DATETIME));
            }
            if end_time.is_none() {
                errors.add("end_time", error("invalid", INVALID_DATETIME));
            }
            return Err(errors);
        };

        Ok(EventInput {
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            start_time,
            end_time,
            is_public: self.is_public(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RsvpForm {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

impl ReviewForm {
    pub fn to_request(&self) -> Result<ReviewRequest, ValidationErrors> {
        let rating = self
            .rating
            .trim()
            .parse::<i64>()
            .map_err(|_| single("rating", "invalid", "A valid integer is required."))?;
        Ok(ReviewRequest {
            rating,
            comment: self.comment.clone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewDeleteForm {
    #[serde(default)]
    pub review_id: String,
}

impl ReviewDeleteForm {
    pub fn review_id(&self) -> Option<Uuid> {
        self.review_id.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub profile_picture: String,
}

impl RegisterForm {
    pub fn to_request(&self) -> Result<RegisterRequest, FormErrors> {
        if self.password1 != self.password2 {
            let mut errors = FormErrors::new();
            errors.add("password2", "The two password fields didn't match.");
            return Err(errors);
        }
        Ok(RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password1.clone(),
            full_name: self.full_name.clone(),
            bio: self.bio.clone(),
            location: self.location.clone(),
            profile_picture: Some(self.profile_picture.clone()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Accepts only same-site paths as a post-login destination.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub profile_picture: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            bio: profile.bio.clone(),
            location: profile.location.clone(),
            profile_picture: profile.profile_picture.clone().unwrap_or_default(),
        }
    }

    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            full_name: self.full_name.clone(),
            bio: self.bio.clone(),
            location: self.location.clone(),
            profile_picture: Some(self.profile_picture.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_datetime_local_is_read_as_utc() {
        let parsed = parse_datetime_local("2030-05-17T18:30").unwrap();
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (2030, 5, 17));
        assert_eq!((parsed.hour(), parsed.minute()), (18, 30));
        assert!(parse_datetime_local("tomorrow").is_none());
    }

    #[test]
    fn test_event_form_reports_bad_dates() {
        let form = EventForm {
            title: "Party".to_string(),
            location: "Home".to_string(),
            start_time: "2030-05-17T18:30".to_string(),
            end_time: String::new(),
            ..EventForm::default()
        };
        let errors = form.to_input().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("end_time"));
        assert!(!fields.contains_key("start_time"));
    }

    #[test]
    fn test_unchecked_box_means_private() {
        let form = EventForm {
            start_time: "2030-05-17T18:30".to_string(),
            end_time: "2030-05-17T20:30".to_string(),
            is_public: None,
            ..EventForm::default()
        };
        assert!(!form.to_input().unwrap().is_public);
    }

    #[test]
    fn test_password_confirmation_must_match() {
        let form = RegisterForm {
            username: "newuser".to_string(),
            password1: "testpass123".to_string(),
            password2: "testpass124".to_string(),
            ..RegisterForm::default()
        };
        let errors = form.to_request().unwrap_err();
        assert_eq!(errors.get("password2").len(), 1);
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/events/create")), Some("/events/create"));
        assert_eq!(safe_next(Some("//evil.example.com")), None);
        assert_eq!(safe_next(Some("https://evil.example.com")), None);
        assert_eq!(safe_next(None), None);
    }

    #[test]
    fn test_review_rating_must_be_a_number() {
        let form = ReviewForm {
            rating: "five".to_string(),
            comment: "Great".to_string(),
        };
        assert!(form.to_request().is_err());
    }
}
