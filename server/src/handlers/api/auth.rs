use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::models::{LoginRequest, PublicUser, RegisterRequest, User};
use crate::services::accounts;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::JsonBody;
use crate::utils::response::{created, success};

#[derive(Serialize)]
struct SessionPayload {
    token: String,
    token_type: &'static str,
    expires_in: i64,
    user: PublicUser,
}

async fn session(state: &AppState, user: &User) -> Result<SessionPayload, AppError> {
    Ok(SessionPayload {
        token: state.tokens.issue(user)?,
        token_type: "Bearer",
        expires_in: state.tokens.ttl().num_seconds(),
        user: accounts::public_user(state.store.as_ref(), user).await?,
    })
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Response, AppError> {
    let user = accounts::register(state.store.as_ref(), request).await?;
    let payload = session(&state, &user).await?;
    Ok(created(payload, "Registration successful"))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Response, AppError> {
    let user = accounts::login(state.store.as_ref(), &request.username, &request.password).await?;
    let payload = session(&state, &user).await?;
    Ok(success(payload, "Login successful"))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let user = accounts::public_user(state.store.as_ref(), &user).await?;
    Ok(success(user, "Current user"))
}
