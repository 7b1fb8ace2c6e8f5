use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Form;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::forms::{EventForm, ReviewDeleteForm, ReviewForm, RsvpForm};
use super::{redirect, render, PageResult};
use crate::auth::{MaybeUser, PageUser};
use crate::models::{RsvpStatus, User};
use crate::services::events::{self as event_service, EventQuery};
use crate::services::{reviews as review_service, rsvps as rsvp_service};
use crate::state::AppState;
use crate::templates::{
    event_detail_page, event_form_page, event_list_page, EventDetailContext, EventListContext,
    FormErrors, Layout,
};
use crate::utils::error::AppError;
use crate::utils::flash::{self, Flash};

pub async fn event_list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<EventQuery>,
    jar: CookieJar,
) -> PageResult {
    let page = event_service::list_events(&state, viewer.user(), &query).await?;
    let mut views = Vec::with_capacity(page.results.len());
    for listing in page.results.iter().cloned() {
        views.push(event_service::present_listing(state.store.as_ref(), listing).await?);
    }
    let page = page.with_results(views);
    let organizers = state
        .store
        .list_organizers(viewer.user().map(|u| u.id))
        .await?;

    let (jar, notice) = flash::take(jar);
    let html = event_list_page(
        Layout::new(viewer.user(), notice.as_ref()),
        &EventListContext {
            page: &page,
            query: &query,
            organizers: &organizers,
        },
    );
    Ok(render(jar, StatusCode::OK, html))
}

pub async fn event_detail(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> PageResult {
    let (jar, notice) = flash::take(jar);
    detail(
        &state,
        viewer.user(),
        id,
        jar,
        notice,
        &ReviewForm::default(),
        &FormErrors::new(),
        StatusCode::OK,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn detail(
    state: &AppState,
    user: Option<&User>,
    id: Uuid,
    jar: CookieJar,
    notice: Option<Flash>,
    review_form: &ReviewForm,
    review_errors: &FormErrors,
    status: StatusCode,
) -> PageResult {
    let store = state.store.as_ref();
    let event = event_service::visible_event(store, id, user).await?;

    let user_rsvp = match user {
        Some(user) => store.find_rsvp(event.id, user.id).await?,
        None => None,
    };
    let rsvps = store.list_event_rsvps(event.id).await?;
    let reviews = store.list_event_reviews(event.id).await?;
    let view = event_service::present(store, event).await?;

    let html = event_detail_page(
        Layout::new(user, notice.as_ref()),
        &EventDetailContext {
            event: &view,
            rsvps: &rsvps,
            user_rsvp: user_rsvp.as_ref(),
            reviews: &reviews,
            review_form,
            review_errors,
        },
    );
    Ok(render(jar, status, html))
}

pub async fn create_form(PageUser(user): PageUser, jar: CookieJar) -> PageResult {
    let html = event_form_page(
        Layout::new(Some(&user), None),
        "Create event",
        "/events/create",
        &EventForm::default(),
        &FormErrors::new(),
    );
    Ok(render(jar, StatusCode::OK, html))
}

pub async fn create(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    Form(form): Form<EventForm>,
) -> PageResult {
    let result = match form.to_input() {
        Ok(input) => event_service::create_event(&state, &user, input).await,
        Err(errors) => Err(errors.into()),
    };

    match result {
        Ok(event) => Ok(redirect(
            jar,
            &format!("/events/{}", event.id),
            Flash::success("Event created successfully!"),
        )),
        Err(AppError::InvalidFields(errors)) => {
            let html = event_form_page(
                Layout::new(Some(&user), None),
                "Create event",
                "/events/create",
                &form,
                &FormErrors::from(&errors),
            );
            Ok(render(jar, StatusCode::UNPROCESSABLE_ENTITY, html))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> PageResult {
    let event = event_service::owned_event(state.store.as_ref(), id, &user).await?;
    let html = event_form_page(
        Layout::new(Some(&user), None),
        "Edit event",
        &format!("/events/{}/edit", event.id),
        &EventForm::from_event(&event),
        &FormErrors::new(),
    );
    Ok(render(jar, StatusCode::OK, html))
}

pub async fn edit(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<EventForm>,
) -> PageResult {
    let event = event_service::owned_event(state.store.as_ref(), id, &user).await?;
    let result = match form.to_input() {
        Ok(input) => event_service::update_event(&state, &user, event.id, input).await,
        Err(errors) => Err(errors.into()),
    };

    match result {
        Ok(event) => Ok(redirect(
            jar,
            &format!("/events/{}", event.id),
            Flash::success("Event updated successfully!"),
        )),
        Err(AppError::InvalidFields(errors)) => {
            let html = event_form_page(
                Layout::new(Some(&user), None),
                "Edit event",
                &format!("/events/{}/edit", event.id),
                &form,
                &FormErrors::from(&errors),
            );
            Ok(render(jar, StatusCode::UNPROCESSABLE_ENTITY, html))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> PageResult {
    event_service::delete_event(&state, &user, id).await?;
    Ok(redirect(jar, "/", Flash::success("Event deleted successfully!")))
}

pub async fn rsvp(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<RsvpForm>,
) -> PageResult {
    let target = format!("/events/{id}");
    let Ok(status) = form.status.parse::<RsvpStatus>() else {
        event_service::visible_event(state.store.as_ref(), id, Some(&user)).await?;
        return Ok(redirect(jar, &target, Flash::error("Please choose a valid RSVP status.")));
    };

    rsvp_service::set_rsvp(&state, id, &user, status).await?;
    Ok(redirect(
        jar,
        &target,
        Flash::success(format!("RSVP updated to \"{status}\"")),
    ))
}

pub async fn review(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<ReviewForm>,
) -> PageResult {
    let result = match form.to_request() {
        Ok(request) => review_service::add_review(&state, id, &user, request).await,
        Err(errors) => Err(errors.into()),
    };

    match result {
        Ok(_) => Ok(redirect(
            jar,
            &format!("/events/{id}"),
            Flash::success("Review submitted successfully!"),
        )),
        Err(AppError::InvalidFields(errors)) => {
            detail(
                &state,
                Some(&user),
                id,
                jar,
                None,
                &form,
                &FormErrors::from(&errors),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_review(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(id): Path<Uuid>,
    jar: CookieJar,
    Form(form): Form<ReviewDeleteForm>,
) -> PageResult {
    let review_id = form
        .review_id()
        .ok_or_else(|| AppError::NotFound("Review not found.".to_string()))?;
    review_service::delete_event_review(&state, id, review_id, &user).await?;
    Ok(redirect(
        jar,
        &format!("/events/{id}"),
        Flash::success("Review deleted successfully!"),
    ))
}
