use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::events::visible_event;
use crate::models::{Review, ReviewRequest, ReviewWithAuthor, User};
use crate::state::AppState;
use crate::store::EventStore;
use crate::utils::error::AppError;

fn review_not_found() -> AppError {
    AppError::NotFound("Review not found.".to_string())
}

pub async fn add_review(
    state: &AppState,
    event_id: Uuid,
    user: &User,
    request: ReviewRequest,
) -> Result<Review, AppError> {
    let event = visible_event(state.store.as_ref(), event_id, Some(user)).await?;
    request.validate()?;

    let review = state
        .store
        .create_review(event.id, user.id, request.stored_rating(), request.comment)
        .await?;
    info!(event_id = %event.id, user = %user.username, rating = review.rating, "Review added");
    Ok(review)
}

pub async fn event_reviews(
    store: &dyn EventStore,
    event_id: Uuid,
    user: &User,
) -> Result<Vec<ReviewWithAuthor>, AppError> {
    let event = visible_event(store, event_id, Some(user)).await?;
    Ok(store.list_event_reviews(event.id).await?)
}

pub async fn own_review(store: &dyn EventStore, id: Uuid, user: &User) -> Result<Review, AppError> {
    store
        .get_review(id)
        .await?
        .filter(|review| review.user_id == user.id)
        .ok_or_else(review_not_found)
}

pub async fn update_own_review(
    state: &AppState,
    id: Uuid,
    user: &User,
    request: ReviewRequest,
) -> Result<Review, AppError> {
    let review = own_review(state.store.as_ref(), id, user).await?;
    request.validate()?;
    Ok(state
        .store
        .update_review(review.id, request.stored_rating(), request.comment)
        .await?)
}

pub async fn delete_own_review(state: &AppState, id: Uuid, user: &User) -> Result<Review, AppError> {
    let review = own_review(state.store.as_ref(), id, user).await?;
    state.store.delete_review(review.id).await?;
    Ok(review)
}

/// Deletes one of the user's reviews of a specific event.
pub async fn delete_event_review(
    state: &AppState,
    event_id: Uuid,
    review_id: Uuid,
    user: &User,
) -> Result<Review, AppError> {
    let review = own_review(state.store.as_ref(), review_id, user).await?;
    if review.event_id != event_id {
        return Err(review_not_found());
    }
    state.store.delete_review(review.id).await?;
    Ok(review)
}
