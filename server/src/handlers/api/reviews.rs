//! The requesting user's own reviews.

use axum::extract::{Path, State};
use axum::response::Response;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::models::{CreateReviewRequest, ReviewPatch, ReviewRequest, ReviewView, UserSummary};
use crate::services::reviews as review_service;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::JsonBody;
use crate::utils::response::{created, empty_success, success};

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let summary = UserSummary::from(&user);
    let reviews: Vec<ReviewView> = state
        .store
        .list_user_reviews(user.id)
        .await?
        .into_iter()
        .map(|review| ReviewView::new(review, summary.clone()))
        .collect();
    Ok(success(reviews, "Reviews retrieved successfully"))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(request): JsonBody<CreateReviewRequest>,
) -> Result<Response, AppError> {
    let (event_id, request) = request.into_parts();
    let review = review_service::add_review(&state, event_id, &user, request).await?;
    Ok(created(
        ReviewView::new(review, UserSummary::from(&user)),
        "Review added successfully",
    ))
}

pub async fn retrieve(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let review = review_service::own_review(state.store.as_ref(), id, &user).await?;
    Ok(success(
        ReviewView::new(review, UserSummary::from(&user)),
        "Review retrieved successfully",
    ))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<ReviewRequest>,
) -> Result<Response, AppError> {
    let review = review_service::update_own_review(&state, id, &user, request).await?;
    Ok(success(
        ReviewView::new(review, UserSummary::from(&user)),
        "Review updated successfully",
    ))
}

pub async fn patch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(patch): JsonBody<ReviewPatch>,
) -> Result<Response, AppError> {
    let current = review_service::own_review(state.store.as_ref(), id, &user).await?;
    let review = review_service::update_own_review(&state, id, &user, patch.apply_to(&current)).await?;
    Ok(success(
        ReviewView::new(review, UserSummary::from(&user)),
        "Review updated successfully",
    ))
}

pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    review_service::delete_own_review(&state, id, &user).await?;
    Ok(empty_success("Review deleted successfully"))
}
