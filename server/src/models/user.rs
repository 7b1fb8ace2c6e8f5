use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::validation::{validate_not_blank, validate_username};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub full_name: String,
    pub bio: String,
    pub location: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Profile created on demand for accounts that predate profiles.
    pub fn placeholder(user: &User) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id,
            full_name: user.username.clone(),
            bio: String::new(),
            location: String::new(),
            profile_picture: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub full_name: String,
    pub bio: String,
    pub location: String,
    pub profile_picture: Option<String>,
}

/// Account as exposed to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile: Option<ProfileView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub full_name: String,
    pub bio: String,
    pub location: String,
    pub profile_picture: Option<String>,
}

impl PublicUser {
    pub fn new(user: &User, profile: Option<&UserProfile>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            profile: profile.map(|p| ProfileView {
                full_name: p.full_name.clone(),
                bio: p.bio.clone(),
                location: p.location.clone(),
                profile_picture: p.profile_picture.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has at most 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password: String,
    #[validate(
        length(max = 255, message = "Ensure this field has at most 255 characters."),
        custom(function = "validate_not_blank")
    )]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has at most 255 characters."))]
    pub location: String,
    #[serde(default)]
    #[validate(url(message = "Enter a valid URL."))]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(
        length(max = 255, message = "Ensure this field has at most 255 characters."),
        custom(function = "validate_not_blank")
    )]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has at most 255 characters."))]
    pub location: String,
    #[serde(default)]
    #[validate(url(message = "Enter a valid URL."))]
    pub profile_picture: Option<String>,
}
