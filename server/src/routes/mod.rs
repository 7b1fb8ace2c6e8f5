use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::api::{auth, events, reviews, rsvps};
use crate::handlers::health_check;
use crate::handlers::pages;
use crate::state::AppState;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .patch(events::patch_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/rsvp", post(events::rsvp))
        .route("/events/:id/rsvp/:user_id", patch(events::update_rsvp))
        .route(
            "/events/:id/reviews",
            get(events::list_reviews).post(events::add_review),
        )
        .route("/rsvps", get(rsvps::list).post(rsvps::create))
        .route(
            "/rsvps/:id",
            get(rsvps::retrieve)
                .put(rsvps::update)
                .patch(rsvps::update)
                .delete(rsvps::destroy),
        )
        .route("/reviews", get(reviews::list).post(reviews::create))
        .route(
            "/reviews/:id",
            get(reviews::retrieve)
                .put(reviews::update)
                .patch(reviews::patch)
                .delete(reviews::destroy),
        )
}

fn page_routes() -> Router<AppState> {
    use pages::{accounts, events};

    Router::new()
        .route("/", get(events::event_list))
        .route(
            "/events/create",
            get(events::create_form).post(events::create),
        )
        .route("/events/:id", get(events::event_detail))
        .route("/events/:id/edit", get(events::edit_form).post(events::edit))
        .route("/events/:id/delete", post(events::delete))
        .route("/events/:id/rsvp", post(events::rsvp))
        .route("/events/:id/review", post(events::review))
        .route("/events/:id/review/delete", post(events::delete_review))
        .route(
            "/register",
            get(accounts::register_form).post(accounts::register),
        )
        .route("/login", get(accounts::login_form).post(accounts::login))
        .route("/logout", get(accounts::logout).post(accounts::logout))
        .route("/profile", get(accounts::profile))
        .route(
            "/profile/edit",
            get(accounts::profile_edit_form).post(accounts::profile_edit),
        )
}

pub fn create_routes(state: AppState) -> Router {
    let production = state.config.production;

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .merge(page_routes())
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(production))
        .layer(create_cors_layer())
        .with_state(state)
}
