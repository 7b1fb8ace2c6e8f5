use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::access::{authorize_mutation, can_view, Viewer};
use crate::models::{Event, EventInput, EventListing, EventPatch, EventView, PublicUser, User};
use crate::notifications::Notification;
use crate::state::AppState;
use crate::store::{EventFilter, EventStore};
use crate::utils::error::AppError;
use crate::utils::pagination::{clamp_page, offset, parse_page, Paginated};

const FORBIDDEN: &str = "You do not have permission to perform this action.";

/// Query parameters accepted by event listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub search: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub page: Option<String>,
}

impl EventQuery {
    fn filter(&self, viewer: Option<&User>) -> EventFilter {
        EventFilter {
            viewer: viewer.map(|u| u.id),
            search: non_empty(self.search.as_deref()),
            location: non_empty(self.location.as_deref()),
            organizer: self
                .organizer
                .as_deref()
                .and_then(|o| o.trim().parse::<Uuid>().ok()),
            limit: 0,
            offset: 0,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub async fn viewer_of(
    store: &dyn EventStore,
    event: &Event,
    user: Option<&User>,
) -> Result<Viewer, AppError> {
    let Some(user) = user else {
        return Ok(Viewer::Anonymous);
    };
    let has_rsvp = user.id != event.organizer_id
        && store.find_rsvp(event.id, user.id).await?.is_some();
    Ok(Viewer::User {
        id: user.id,
        has_rsvp,
    })
}

/// Loads an event the viewer may see. Hidden and missing events are
/// indistinguishable.
pub async fn visible_event(
    store: &dyn EventStore,
    id: Uuid,
    user: Option<&User>,
) -> Result<Event, AppError> {
    let event = store
        .get_event(id)
        .await?
        .ok_or_else(AppError::event_not_found)?;

    if !can_view(&event, &viewer_of(store, &event, user).await?) {
        return Err(AppError::event_not_found());
    }
    Ok(event)
}

/// Loads an event the requester may change.
pub async fn owned_event(store: &dyn EventStore, id: Uuid, user: &User) -> Result<Event, AppError> {
    let event = visible_event(store, id, Some(user)).await?;
    if !authorize_mutation(&event, user) {
        return Err(AppError::Forbidden(FORBIDDEN.to_string()));
    }
    Ok(event)
}

pub async fn list_events(
    state: &AppState,
    viewer: Option<&User>,
    query: &EventQuery,
) -> Result<Paginated<EventListing>, AppError> {
    let per_page = state.page_size();
    let requested = parse_page(query.page.as_deref());

    let mut filter = query.filter(viewer);
    filter.limit = per_page;
    filter.offset = offset(requested, per_page);
    let (mut rows, total) = state.store.list_events(&filter).await?;

    let page = clamp_page(requested, total, per_page);
    if page != requested {
        filter.offset = offset(page, per_page);
        rows = state.store.list_events(&filter).await?.0;
    }

    Ok(Paginated::new(rows, total, page, per_page))
}

pub async fn create_event(state: &AppState, organizer: &User, input: EventInput) -> Result<Event, AppError> {
    input.validate()?;
    let event = state.store.create_event(organizer.id, input).await?;
    info!(event_id = %event.id, organizer = %organizer.username, "Event created");

    state
        .notifier
        .dispatch(Notification::EventCreated { event_id: event.id });
    Ok(event)
}

pub async fn update_event(
    state: &AppState,
    user: &User,
    id: Uuid,
    input: EventInput,
) -> Result<Event, AppError> {
    let event = owned_event(state.store.as_ref(), id, user).await?;
    save_changes(state, event, input).await
}

/// Applies the supplied fields and validates the merged event as a whole.
pub async fn patch_event(
    state: &AppState,
    user: &User,
    id: Uuid,
    patch: EventPatch,
) -> Result<Event, AppError> {
    let event = owned_event(state.store.as_ref(), id, user).await?;
    let input = EventInput::from_event(&event).merge(patch);
    save_changes(state, event, input).await
}

async fn save_changes(state: &AppState, event: Event, input: EventInput) -> Result<Event, AppError> {
    input.validate()?;
    let updated = state.store.update_event(event.id, input).await?;
    info!(event_id = %updated.id, "Event updated");

    state
        .notifier
        .dispatch(Notification::EventUpdated { event_id: updated.id });
    Ok(updated)
}

pub async fn delete_event(state: &AppState, user: &User, id: Uuid) -> Result<Event, AppError> {
    let event = owned_event(state.store.as_ref(), id, user).await?;
    state.store.delete_event(event.id).await?;
    info!(event_id = %event.id, "Event deleted");
    Ok(event)
}

pub async fn organizer_of(store: &dyn EventStore, event: &Event) -> Result<PublicUser, AppError> {
    let organizer = store
        .get_user(event.organizer_id)
        .await?
        .ok_or_else(|| AppError::InternalServerError(format!("event {} has no organizer", event.id)))?;
    let profile = store.get_profile(organizer.id).await?;
    Ok(PublicUser::new(&organizer, profile.as_ref()))
}

pub async fn present(store: &dyn EventStore, event: Event) -> Result<EventView, AppError> {
    let rsvp_count = store.count_rsvps(event.id).await?;
    let organizer = organizer_of(store, &event).await?;
    Ok(EventView::new(event, organizer, rsvp_count))
}

pub async fn present_listing(store: &dyn EventStore, listing: EventListing) -> Result<EventView, AppError> {
    let organizer = organizer_of(store, &listing.event).await?;
    Ok(EventView::new(listing.event, organizer, listing.rsvp_count))
}
