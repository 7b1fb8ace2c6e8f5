use axum::extract::{Path, Query, State};
use axum::response::Response;
use uuid::Uuid;

use crate::auth::{CurrentUser, MaybeUser};
use crate::models::{
    EventInput, EventPatch, EventView, ReviewRequest, ReviewView, RsvpRequest, RsvpStatus,
    RsvpView, UserSummary,
};
use crate::services::events::{self as event_service, EventQuery};
use crate::services::{reviews as review_service, rsvps as rsvp_service};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::JsonBody;
use crate::utils::response::{created, empty_success, success};

pub async fn list_events(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<EventQuery>,
) -> Result<Response, AppError> {
    let page = event_service::list_events(&state, viewer.user(), &query).await?;

    let mut views: Vec<EventView> = Vec::with_capacity(page.results.len());
    for listing in page.results.iter().cloned() {
        views.push(event_service::present_listing(state.store.as_ref(), listing).await?);
    }
    Ok(success(page.with_results(views), "Events retrieved successfully"))
}

pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(input): JsonBody<EventInput>,
) -> Result<Response, AppError> {
    let event = event_service::create_event(&state, &user, input).await?;
    let view = event_service::present(state.store.as_ref(), event).await?;
    Ok(created(view, "Event created successfully"))
}

pub async fn get_event(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = event_service::visible_event(state.store.as_ref(), id, viewer.user()).await?;
    let view = event_service::present(state.store.as_ref(), event).await?;
    Ok(success(view, "Event retrieved successfully"))
}

pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(input): JsonBody<EventInput>,
) -> Result<Response, AppError> {
    let event = event_service::update_event(&state, &user, id, input).await?;
    let view = event_service::present(state.store.as_ref(), event).await?;
    Ok(success(view, "Event updated successfully"))
}

pub async fn patch_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(patch): JsonBody<EventPatch>,
) -> Result<Response, AppError> {
    let event = event_service::patch_event(&state, &user, id, patch).await?;
    let view = event_service::present(state.store.as_ref(), event).await?;
    Ok(success(view, "Event updated successfully"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    event_service::delete_event(&state, &user, id).await?;
    Ok(empty_success("Event deleted successfully"))
}

pub async fn rsvp(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<RsvpRequest>,
) -> Result<Response, AppError> {
    let status = RsvpStatus::parse_field(&request.status)?;
    let rsvp = rsvp_service::set_rsvp(&state, id, &user, status).await?;
    Ok(success(
        RsvpView::new(rsvp, UserSummary::from(&user)),
        format!("RSVP updated to \"{status}\""),
    ))
}

pub async fn update_rsvp(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, attendee_id)): Path<(Uuid, Uuid)>,
    JsonBody(request): JsonBody<RsvpRequest>,
) -> Result<Response, AppError> {
    let status = RsvpStatus::parse_field(&request.status)?;
    let rsvp = rsvp_service::update_attendee_rsvp(&state, id, attendee_id, &user, status).await?;

    let attendee = state
        .store
        .get_user(rsvp.user_id)
        .await?
        .map(|u| UserSummary::from(&u))
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    Ok(success(RsvpView::new(rsvp, attendee), "RSVP updated successfully"))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let reviews: Vec<ReviewView> = review_service::event_reviews(state.store.as_ref(), id, &user)
        .await?
        .into_iter()
        .map(ReviewView::from)
        .collect();
    Ok(success(reviews, "Reviews retrieved successfully"))
}

pub async fn add_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<ReviewRequest>,
) -> Result<Response, AppError> {
    let review = review_service::add_review(&state, id, &user, request).await?;
    Ok(created(
        ReviewView::new(review, UserSummary::from(&user)),
        "Review added successfully",
    ))
}
