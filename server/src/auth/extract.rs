use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use super::TokenManager;
use crate::models::User;
use crate::state::AppState;
use crate::templates::PageError;
use crate::utils::error::AppError;

pub const SESSION_COOKIE: &str = "eventhub_session";

fn session_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(TokenManager::bearer)
        .map(str::to_string);

    from_header.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    })
}

/// Resolves the requesting user. Missing, invalid and stale tokens all
/// resolve to `None`.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(token) = session_token(parts) else {
        return Ok(None);
    };
    let Ok(user_id) = state.tokens.verify(&token).and_then(|claims| claims.user_id()) else {
        return Ok(None);
    };

    let user = state.store.get_user(user_id).await?;
    if user.is_none() {
        tracing::debug!(%user_id, "Session token refers to a missing user");
    }
    Ok(user)
}

/// The authenticated user; rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| {
                AppError::AuthError("Authentication credentials were not provided.".to_string())
            })
    }
}

/// The authenticated user, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(authenticate(parts, state).await?))
    }
}

/// The authenticated user on an HTML page; anonymous visitors are sent to
/// the login page.
#[derive(Debug, Clone)]
pub struct PageUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for PageUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(Some(user)) => Ok(PageUser(user)),
            Ok(None) => {
                let target = format!("/login?next={}", parts.uri.path());
                Err(Redirect::to(&target).into_response())
            }
            Err(e) => Err(PageError::from(e).into_response()),
        }
    }
}

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}
