use tracing::info;
use uuid::Uuid;

use super::events::visible_event;
use crate::access::authorize_mutation;
use crate::models::{Rsvp, RsvpStatus, User};
use crate::notifications::Notification;
use crate::state::AppState;
use crate::store::EventStore;
use crate::utils::error::AppError;

fn rsvp_not_found() -> AppError {
    AppError::NotFound("RSVP not found.".to_string())
}

/// Records the user's answer for an event, creating the RSVP or updating it
/// in place. A confirmation goes out whenever the stored status changes.
pub async fn set_rsvp(
    state: &AppState,
    event_id: Uuid,
    user: &User,
    status: RsvpStatus,
) -> Result<Rsvp, AppError> {
    let event = visible_event(state.store.as_ref(), event_id, Some(user)).await?;

    let previous = state.store.find_rsvp(event.id, user.id).await?;
    let rsvp = state.store.upsert_rsvp(event.id, user.id, status).await?;

    if previous.map(|p| p.status) != Some(status) {
        info!(event_id = %event.id, user = %user.username, %status, "RSVP recorded");
        confirm(state, &rsvp);
    }
    Ok(rsvp)
}

/// Changes the status of `attendee_id`'s RSVP on an event. Allowed for the
/// attendee and for the organizer.
pub async fn update_attendee_rsvp(
    state: &AppState,
    event_id: Uuid,
    attendee_id: Uuid,
    requester: &User,
    status: RsvpStatus,
) -> Result<Rsvp, AppError> {
    let event = visible_event(state.store.as_ref(), event_id, Some(requester)).await?;
    if requester.id != attendee_id && !authorize_mutation(&event, requester) {
        return Err(AppError::Forbidden(
            "You do not have permission to change this RSVP.".to_string(),
        ));
    }

    let rsvp = state
        .store
        .find_rsvp(event.id, attendee_id)
        .await?
        .ok_or_else(rsvp_not_found)?;
    change_status(state, rsvp, status).await
}

/// One of the requester's own RSVPs; other users' RSVPs do not exist for them.
pub async fn own_rsvp(store: &dyn EventStore, id: Uuid, user: &User) -> Result<Rsvp, AppError> {
    store
        .get_rsvp(id)
        .await?
        .filter(|rsvp| rsvp.user_id == user.id)
        .ok_or_else(rsvp_not_found)
}

pub async fn update_own_rsvp(
    state: &AppState,
    id: Uuid,
    user: &User,
    status: RsvpStatus,
) -> Result<Rsvp, AppError> {
    let rsvp = own_rsvp(state.store.as_ref(), id, user).await?;
    change_status(state, rsvp, status).await
}

pub async fn delete_own_rsvp(state: &AppState, id: Uuid, user: &User) -> Result<(), AppError> {
    let rsvp = own_rsvp(state.store.as_ref(), id, user).await?;
    state.store.delete_rsvp(rsvp.id).await?;
    Ok(())
}

async fn change_status(state: &AppState, rsvp: Rsvp, status: RsvpStatus) -> Result<Rsvp, AppError> {
    if rsvp.status == status {
        return Ok(rsvp);
    }
    let updated = state.store.update_rsvp_status(rsvp.id, status).await?;
    confirm(state, &updated);
    Ok(updated)
}

fn confirm(state: &AppState, rsvp: &Rsvp) {
    state.notifier.dispatch(Notification::RsvpConfirmation {
        event_id: rsvp.event_id,
        user_id: rsvp.user_id,
    });
}
