#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use eventhub_server::config::Config;
use eventhub_server::notifications::RecordingMailer;
use eventhub_server::routes::create_routes;
use eventhub_server::state::AppState;
use eventhub_server::store::MemoryStore;

pub const PASSWORD: &str = "correct-horse-battery";

/// The full router backed by an in-memory store and a recording mailer.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub cookies: Vec<String>,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }

    /// `name=value` pairs from every Set-Cookie header, ready to send back.
    pub fn cookie_header(&self) -> String {
        self.cookies.join("; ")
    }
}

impl TestApp {
    pub fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::new());
        let state = AppState::new(Config::default(), Arc::new(MemoryStore::new()), mailer.clone());
        Self {
            router: create_routes(state.clone()),
            state,
            mailer,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        read(response).await
    }

    pub async fn api(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.send(request.unwrap()).await
    }

    pub async fn get_page(&self, uri: &str, cookies: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookies) = cookies {
            builder = builder.header(COOKIE, cookies);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookies: Option<&str>, form: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookies) = cookies {
            builder = builder.header(COOKIE, cookies);
        }
        let body = serde_urlencoded::to_string(form).unwrap();
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Registers a user through the API and returns its bearer token.
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .api(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                    "full_name": username,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.json()["data"]["token"].as_str().unwrap().to_string()
    }

    /// Creates an event through the API and returns its id.
    pub async fn create_event(&self, token: &str, title: &str, is_public: bool) -> String {
        let start = Utc::now() + Duration::days(3);
        let response = self
            .api(
                Method::POST,
                "/api/events",
                Some(token),
                Some(event_body(title, start, start + Duration::hours(2), is_public)),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.json()["data"]["id"].as_str().unwrap().to_string()
    }
}

pub fn event_body(title: &str, start: DateTime<Utc>, end: DateTime<Utc>, is_public: bool) -> Value {
    json!({
        "title": title,
        "description": "Talks and snacks",
        "location": "Main Hall",
        "start_time": start,
        "end_time": end,
        "is_public": is_public,
    })
}

async fn read(response: Response<Body>) -> TestResponse {
    let status = response.status();
    let cookies = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::to_string)
        .collect();
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    TestResponse {
        status,
        cookies,
        location,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}
