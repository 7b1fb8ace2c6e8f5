use std::fmt::Write as _;

use super::{escape, format_datetime, FormErrors, Layout};
use crate::handlers::pages::forms::{ProfileForm, RegisterForm};
use crate::models::{Event, User, UserProfile, UserRsvp};

pub fn login_page(layout: Layout<'_>, username: &str, next: Option<&str>, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<ul class="errors"><li>{}</li></ul>"#, escape(e)))
        .unwrap_or_default();
    let next = next
        .map(|n| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(n)))
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Log in</h1>
<form method="post" action="/login" class="card">
  {error}
  {next}
  <label for="username">Username</label>
  <input id="username" name="username" value="{username}" autofocus>
  <label for="password">Password</label>
  <input id="password" name="password" type="password">
  <button type="submit">Log in</button>
</form>
<p>No account yet? <a href="/register">Register</a></p>"#,
        username = escape(username),
    );
    layout.render("Log in", &body)
}

pub fn register_page(layout: Layout<'_>, form: &RegisterForm, errors: &FormErrors) -> String {
    let body = format!(
        r#"<h1>Register</h1>
<form method="post" action="/register" class="card">
  {non_field}
  <label for="username">Username</label>
  <input id="username" name="username" maxlength="150" value="{username}">
  {username_errors}
  <label for="email">Email</label>
  <input id="email" name="email" type="email" value="{email}">
  {email_errors}
  <label for="password1">Password</label>
  <input id="password1" name="password1" type="password">
  {password1_errors}
  <label for="password2">Password confirmation</label>
  <input id="password2" name="password2" type="password">
  {password2_errors}
  <label for="full_name">Full name</label>
  <input id="full_name" name="full_name" maxlength="255" value="{full_name}">
  {full_name_errors}
  <label for="bio">Bio</label>
  <textarea id="bio" name="bio" rows="3">{bio}</textarea>
  <label for="location">Location</label>
  <input id="location" name="location" maxlength="255" value="{location}">
  {location_errors}
  <label for="profile_picture">Profile picture URL</label>
  <input id="profile_picture" name="profile_picture" type="url" value="{picture}">
  {picture_errors}
  <button type="submit">Register</button>
</form>"#,
        non_field = errors.render_non_field(),
        username = escape(&form.username),
        username_errors = errors.render("username"),
        email = escape(&form.email),
        email_errors = errors.render("email"),
        // RegisterRequest reports password rules under `password`.
        password1_errors = errors.render("password"),
        password2_errors = errors.render("password2"),
        full_name = escape(&form.full_name),
        full_name_errors = errors.render("full_name"),
        bio = escape(&form.bio),
        location = escape(&form.location),
        location_errors = errors.render("location"),
        picture = escape(&form.profile_picture),
        picture_errors = errors.render("profile_picture"),
    );
    layout.render("Register", &body)
}

pub struct ProfileContext<'a> {
    pub user: &'a User,
    pub profile: &'a UserProfile,
    pub organized: &'a [Event],
    pub rsvps: &'a [UserRsvp],
}

pub fn profile_page(layout: Layout<'_>, ctx: &ProfileContext<'_>) -> String {
    let profile = ctx.profile;

    let picture = profile
        .profile_picture
        .as_deref()
        .map(|url| {
            format!(
                r#"<img src="{}" alt="Profile picture" width="96" height="96">"#,
                escape(url)
            )
        })
        .unwrap_or_default();

    let mut organized = String::new();
    for event in ctx.organized {
        let _ = write!(
            organized,
            r#"<li><a href="/events/{}">{}</a> <span class="muted">{}</span></li>"#,
            event.id,
            escape(&event.title),
            format_datetime(event.start_time)
        );
    }
    if organized.is_empty() {
        organized.push_str(r#"<li class="muted">You have not organized any events.</li>"#);
    }

    let mut rsvps = String::new();
    for row in ctx.rsvps {
        let _ = write!(
            rsvps,
            r#"<li><a href="/events/{}">{}</a> &middot; {} <span class="muted">{}</span></li>"#,
            row.rsvp.event_id,
            escape(&row.event_title),
            row.rsvp.status,
            format_datetime(row.event_start_time)
        );
    }
    if rsvps.is_empty() {
        rsvps.push_str(r#"<li class="muted">No RSVPs yet.</li>"#);
    }

    let body = format!(
        r#"<div class="card">
  {picture}
  <h1>{full_name}</h1>
  <p class="muted">@{username} &middot; {email}</p>
  <p>{location}</p>
  <p>{bio}</p>
  <a href="/profile/edit">Edit profile</a>
</div>
<section>
  <h2>My events</h2>
  <ul>{organized}</ul>
</section>
<section>
  <h2>My RSVPs</h2>
  <ul>{rsvps}</ul>
</section>"#,
        full_name = escape(&profile.full_name),
        username = escape(&ctx.user.username),
        email = escape(&ctx.user.email),
        location = escape(&profile.location),
        bio = escape(&profile.bio),
    );
    layout.render("Profile", &body)
}

pub fn profile_edit_page(layout: Layout<'_>, form: &ProfileForm, errors: &FormErrors) -> String {
    let body = format!(
        r#"<h1>Edit profile</h1>
<form method="post" action="/profile/edit" class="card">
  <label for="full_name">Full name</label>
  <input id="full_name" name="full_name" maxlength="255" value="{full_name}">
  {full_name_errors}
  <label for="bio">Bio</label>
  <textarea id="bio" name="bio" rows="4">{bio}</textarea>
  <label for="location">Location</label>
  <input id="location" name="location" maxlength="255" value="{location}">
  {location_errors}
  <label for="profile_picture">Profile picture URL</label>
  <input id="profile_picture" name="profile_picture" type="url" value="{picture}">
  {picture_errors}
  <button type="submit">Save</button>
</form>"#,
        full_name = escape(&form.full_name),
        full_name_errors = errors.render("full_name"),
        bio = escape(&form.bio),
        location = escape(&form.location),
        location_errors = errors.render("location"),
        picture = escape(&form.profile_picture),
        picture_errors = errors.render("profile_picture"),
    );
    layout.render("Edit profile", &body)
}
