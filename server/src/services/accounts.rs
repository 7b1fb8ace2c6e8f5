use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::models::{
    NewProfile, NewUser, ProfileUpdate, PublicUser, RegisterRequest, User, UserProfile,
};
use crate::store::{EventStore, StoreError};
use crate::utils::error::AppError;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";

fn blank_as_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Creates the account and its profile.
pub async fn register(store: &dyn EventStore, mut request: RegisterRequest) -> Result<User, AppError> {
    request.profile_picture = blank_as_none(request.profile_picture);
    request.validate()?;

    let password_hash = hash_password(&request.password)?;
    let user = NewUser {
        username: request.username,
        email: request.email,
        password_hash,
    };
    let profile = NewProfile {
        full_name: request.full_name,
        bio: request.bio,
        location: request.location,
        profile_picture: request.profile_picture,
    };

    let user = store.create_user(user, profile).await.map_err(|e| match e {
        StoreError::Conflict(_) => AppError::Conflict(USERNAME_TAKEN.to_string()),
        other => other.into(),
    })?;
    info!(user_id = %user.id, username = %user.username, "User registered");
    Ok(user)
}

pub async fn login(store: &dyn EventStore, username: &str, password: &str) -> Result<User, AppError> {
    let user = store.find_user_by_username(username.trim()).await?;
    match user {
        Some(user) if verify_password(password, &user.password_hash) => {
            info!(user_id = %user.id, "User logged in");
            Ok(user)
        }
        _ => Err(AppError::AuthError(INVALID_CREDENTIALS.to_string())),
    }
}

/// The user's profile, created with defaults on first access.
pub async fn profile(store: &dyn EventStore, user: &User) -> Result<UserProfile, AppError> {
    if let Some(profile) = store.get_profile(user.id).await? {
        return Ok(profile);
    }
    Ok(store.save_profile(UserProfile::placeholder(user)).await?)
}

pub async fn update_profile(
    store: &dyn EventStore,
    user: &User,
    mut update: ProfileUpdate,
) -> Result<UserProfile, AppError> {
    update.profile_picture = blank_as_none(update.profile_picture);
    update.validate()?;
    let current = profile(store, user).await?;

    let profile = UserProfile {
        user_id: user.id,
        full_name: update.full_name,
        bio: update.bio,
        location: update.location,
        profile_picture: update.profile_picture,
        created_at: current.created_at,
        updated_at: Utc::now(),
    };
    Ok(store.save_profile(profile).await?)
}

pub async fn public_user(store: &dyn EventStore, user: &User) -> Result<PublicUser, AppError> {
    let profile = store.get_profile(user.id).await?;
    Ok(PublicUser::new(user, profile.as_ref()))
}
