//! Server-rendered HTML.
//!
//! Pages are assembled with `format!`; every piece of user-supplied text goes
//! through [`escape`] before it is embedded.

mod accounts;
mod events;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Utc};
use validator::ValidationErrors;

use crate::models::validation::{messages_for, NON_FIELD_ERRORS};
use crate::models::User;
use crate::store::StoreError;
use crate::utils::error::AppError;
use crate::utils::flash::Flash;

pub use accounts::{login_page, profile_edit_page, profile_page, register_page, ProfileContext};
pub use events::{event_detail_page, event_form_page, event_list_page, EventDetailContext, EventListContext};

pub const SITE_NAME: &str = "Events Hub";

pub fn escape(text: &str) -> String {
    html_escape::encode_safe(text).into_owned()
}

pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%b %-d, %Y %H:%M UTC").to_string()
}

/// Value for an `<input type="datetime-local">`.
pub fn datetime_input(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M").to_string()
}

/// What every page needs to draw its chrome.
#[derive(Debug, Clone, Copy, Default)]
pub struct Layout<'a> {
    pub user: Option<&'a User>,
    pub flash: Option<&'a Flash>,
}

impl<'a> Layout<'a> {
    pub fn new(user: Option<&'a User>, flash: Option<&'a Flash>) -> Self {
        Self { user, flash }
    }

    pub fn render(&self, title: &str, body: &str) -> String {
        let nav = match self.user {
            Some(user) => format!(
                r#"<a href="/events/create">Create event</a>
      <a href="/profile">{}</a>
      <a href="/logout">Log out</a>"#,
                escape(&user.username)
            ),
            None => r#"<a href="/login">Log in</a>
      <a href="/register">Register</a>"#
                .to_string(),
        };
        let flash = self
            .flash
            .map(|f| {
                format!(
                    r#"<div class="flash flash-{}">{}</div>"#,
                    f.level.as_str(),
                    escape(&f.message)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} | {site}</title>
  <style>
    body {{ font-family: system-ui, sans-serif; margin: 0; color: #222; }}
    header {{ display: flex; justify-content: space-between; padding: 1rem 2rem; background: #1f3a60; }}
    header a {{ color: #fff; margin-left: 1rem; text-decoration: none; }}
    main {{ max-width: 960px; margin: 0 auto; padding: 1.5rem 2rem; }}
    .flash {{ padding: .75rem 1rem; margin-bottom: 1rem; border-radius: 4px; }}
    .flash-success {{ background: #e3f6e8; }} .flash-info {{ background: #e6f0fb; }} .flash-error {{ background: #fde8e8; }}
    .errors {{ color: #b42318; margin: .25rem 0; padding-left: 1.2rem; }}
    .card {{ border: 1px solid #ddd; border-radius: 6px; padding: 1rem; margin-bottom: 1rem; }}
    .muted {{ color: #666; font-size: .9rem; }}
    label {{ display: block; margin-top: .75rem; font-weight: 600; }}
    input, textarea, select {{ width: 100%; padding: .4rem; box-sizing: border-box; }}
    input[type=checkbox] {{ width: auto; }}
    button {{ margin-top: 1rem; padding: .5rem 1rem; }}
  </style>
</head>
<body>
  <header>
    <a href="/"><strong>{site}</strong></a>
    <nav>
      {nav}
    </nav>
  </header>
  <main>
    {flash}
    {body}
  </main>
</body>
</html>"#,
            title = escape(title),
            site = SITE_NAME,
        )
    }
}

/// Field messages to show next to form inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Messages for `field` as an HTML list, empty when there are none.
    pub fn render(&self, field: &str) -> String {
        let messages = self.get(field);
        if messages.is_empty() {
            return String::new();
        }
        let mut html = String::from(r#"<ul class="errors">"#);
        for message in messages {
            let _ = write!(html, "<li>{}</li>", escape(message));
        }
        html.push_str("</ul>");
        html
    }

    pub fn render_non_field(&self) -> String {
        self.render(NON_FIELD_ERRORS)
    }
}

impl From<&ValidationErrors> for FormErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut form = FormErrors::new();
        for field in errors.field_errors().keys() {
            let field: &str = field.as_ref();
            for message in messages_for(errors, field) {
                form.add(field, message);
            }
        }
        form
    }
}

/// An [`AppError`] rendered as an HTML page.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl From<StoreError> for PageError {
    fn from(err: StoreError) -> Self {
        PageError(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        self.0.log();

        let heading = match status {
            StatusCode::NOT_FOUND => "Page not found",
            StatusCode::FORBIDDEN => "Permission denied",
            StatusCode::UNAUTHORIZED => "Login required",
            s if s.is_server_error() => "Something went wrong",
            _ => "Request rejected",
        };
        let body = format!(
            r#"<h1>{heading}</h1>
<p>{}</p>
<p><a href="/">Back to events</a></p>"#,
            escape(&self.0.public_message())
        );
        let page = Layout::default().render(heading, &body);
        (status, Html(page)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validation;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b class="x">Tom & 'Jerry'"#),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_form_errors_from_validation() {
        let errors = validation::single("title", "blank", "This field may not be blank.");
        let form = FormErrors::from(&errors);
        assert_eq!(form.get("title"), ["This field may not be blank.".to_string()]);
        assert!(form.render("title").contains("This field may not be blank."));
        assert_eq!(form.render("location"), "");
    }

    #[test]
    fn test_layout_shows_flash_and_escapes_title() {
        let flash = Flash::success("Event created successfully!");
        let html = Layout::new(None, Some(&flash)).render("<Party>", "<p>body</p>");
        assert!(html.contains("flash-success"));
        assert!(html.contains("&lt;Party&gt;"));
        assert!(html.contains(r#"href="/login""#));
    }
}
