use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

use super::forms::{safe_next, LoginForm, NextQuery, ProfileForm, RegisterForm};
use super::{redirect, render, PageResult};
use crate::auth::{MaybeUser, PageUser, SESSION_COOKIE};
use crate::models::User;
use crate::services::accounts;
use crate::state::AppState;
use crate::templates::{
    login_page, profile_edit_page, profile_page, register_page, FormErrors, Layout, ProfileContext,
};
use crate::utils::error::AppError;
use crate::utils::flash::{self, Flash};

fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, AppError> {
    let token = state.tokens.issue(user)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.production);
    Ok(jar.add(cookie))
}

pub async fn register_form(viewer: MaybeUser, jar: CookieJar) -> PageResult {
    if viewer.user().is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let (jar, notice) = flash::take(jar);
    let html = register_page(
        Layout::new(None, notice.as_ref()),
        &RegisterForm::default(),
        &FormErrors::new(),
    );
    Ok(render(jar, StatusCode::OK, html))
}

pub async fn register(
    State(state): State<AppState>,
    viewer: MaybeUser,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> PageResult {
    if viewer.user().is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let errors = match form.to_request() {
        Err(errors) => errors,
        Ok(request) => match accounts::register(state.store.as_ref(), request).await {
            Ok(user) => {
                let jar = start_session(&state, jar, &user)?;
                return Ok(redirect(jar, "/", Flash::success("Registration successful!")));
            }
            Err(AppError::InvalidFields(errors)) => FormErrors::from(&errors),
            Err(AppError::Conflict(message)) => {
                let mut errors = FormErrors::new();
                errors.add("username", message);
                errors
            }
            Err(e) => return Err(e.into()),
        },
    };

    let html = register_page(Layout::default(), &form, &errors);
    Ok(render(jar, StatusCode::UNPROCESSABLE_ENTITY, html))
}

pub async fn login_form(
    viewer: MaybeUser,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
) -> PageResult {
    if viewer.user().is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let (jar, notice) = flash::take(jar);
    let html = login_page(
        Layout::new(None, notice.as_ref()),
        "",
        safe_next(query.next.as_deref()),
        None,
    );
    Ok(render(jar, StatusCode::OK, html))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> PageResult {
    let next = safe_next(form.next.as_deref());
    match accounts::login(state.store.as_ref(), &form.username, &form.password).await {
        Ok(user) => {
            let jar = start_session(&state, jar, &user)?;
            Ok(redirect(
                jar,
                next.unwrap_or("/"),
                Flash::success("Login successful!"),
            ))
        }
        Err(AppError::AuthError(message)) => {
            let html = login_page(Layout::default(), &form.username, next, Some(&message));
            Ok(render(jar, StatusCode::UNPROCESSABLE_ENTITY, html))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(jar: CookieJar) -> PageResult {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok(redirect(jar, "/", Flash::info("You have been logged out.")))
}

pub async fn profile(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
) -> PageResult {
    let store = state.store.as_ref();
    let profile = accounts::profile(store, &user).await?;
    let organized = store.list_organized_events(user.id).await?;
    let rsvps = store.list_user_rsvps(user.id).await?;

    let (jar, notice) = flash::take(jar);
    let html = profile_page(
        Layout::new(Some(&user), notice.as_ref()),
        &ProfileContext {
            user: &user,
            profile: &profile,
            organized: &organized,
            rsvps: &rsvps,
        },
    );
    Ok(render(jar, StatusCode::OK, html))
}

pub async fn profile_edit_form(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
) -> PageResult {
    let profile = accounts::profile(state.store.as_ref(), &user).await?;
    let html = profile_edit_page(
        Layout::new(Some(&user), None),
        &ProfileForm::from_profile(&profile),
        &FormErrors::new(),
    );
    Ok(render(jar, StatusCode::OK, html))
}

pub async fn profile_edit(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> PageResult {
    match accounts::update_profile(state.store.as_ref(), &user, form.to_update()).await {
        Ok(_) => Ok(redirect(jar, "/profile", Flash::success("Profile updated successfully!"))),
        Err(AppError::InvalidFields(errors)) => {
            let html = profile_edit_page(
                Layout::new(Some(&user), None),
                &form,
                &FormErrors::from(&errors),
            );
            Ok(render(jar, StatusCode::UNPROCESSABLE_ENTITY, html))
        }
        Err(e) => Err(e.into()),
    }
}
