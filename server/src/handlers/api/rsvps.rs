//! The requesting user's own RSVPs.

use axum::extract::{Path, State};
use axum::response::Response;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::models::{CreateRsvpRequest, RsvpRequest, RsvpStatus, RsvpView, UserSummary};
use crate::services::rsvps as rsvp_service;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::JsonBody;
use crate::utils::response::{created, empty_success, success};

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let summary = UserSummary::from(&user);
    let rsvps: Vec<RsvpView> = state
        .store
        .list_user_rsvps(user.id)
        .await?
        .into_iter()
        .map(|row| RsvpView::new(row.rsvp, summary.clone()))
        .collect();
    Ok(success(rsvps, "RSVPs retrieved successfully"))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(request): JsonBody<CreateRsvpRequest>,
) -> Result<Response, AppError> {
    let status = RsvpStatus::parse_field(&request.status)?;
    let rsvp = rsvp_service::set_rsvp(&state, request.event, &user, status).await?;
    Ok(created(
        RsvpView::new(rsvp, UserSummary::from(&user)),
        "RSVP saved successfully",
    ))
}

pub async fn retrieve(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let rsvp = rsvp_service::own_rsvp(state.store.as_ref(), id, &user).await?;
    Ok(success(
        RsvpView::new(rsvp, UserSummary::from(&user)),
        "RSVP retrieved successfully",
    ))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<RsvpRequest>,
) -> Result<Response, AppError> {
    let status = RsvpStatus::parse_field(&request.status)?;
    let rsvp = rsvp_service::update_own_rsvp(&state, id, &user, status).await?;
    Ok(success(
        RsvpView::new(rsvp, UserSummary::from(&user)),
        "RSVP updated successfully",
    ))
}

pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    rsvp_service::delete_own_rsvp(&state, id, &user).await?;
    Ok(empty_success("RSVP deleted successfully"))
}
