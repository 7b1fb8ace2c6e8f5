//! Server-rendered pages. Form posts answer with a redirect carrying a flash
//! message, or re-render the form with its errors and a 422.

pub mod accounts;
pub mod events;
pub mod forms;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::templates::PageError;
use crate::utils::flash::{self, Flash};

pub type PageResult = Result<Response, PageError>;

fn render(jar: CookieJar, status: StatusCode, html: String) -> Response {
    (status, jar, Html(html)).into_response()
}

fn redirect(jar: CookieJar, to: &str, notice: Flash) -> Response {
    (flash::set(jar, notice), Redirect::to(to)).into_response()
}
