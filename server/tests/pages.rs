mod common;

use axum::http::StatusCode;

use common::TestApp;

/// Registers a user, logs in through the page form and returns the session
/// cookie header.
async fn login(app: &TestApp, username: &str) -> String {
    app.register(username).await;
    session_for(app, username).await
}

async fn session_for(app: &TestApp, username: &str) -> String {
    let response = app
        .post_form(
            "/login",
            None,
            &[("username", username), ("password", common::PASSWORD), ("next", "")],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    response
        .cookies
        .iter()
        .find(|c| c.starts_with("eventhub_session="))
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn test_event_list_renders_for_anonymous_visitors() {
    let app = TestApp::new();
    let response = app.get_page("/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<html"));
    assert!(response.body.contains("Log in"));
}

#[tokio::test]
async fn test_protected_page_redirects_to_login() {
    let app = TestApp::new();
    let response = app.get_page("/profile", None).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/login?next=/profile"));
}

#[tokio::test]
async fn test_login_sets_session_and_flash() {
    let app = TestApp::new();
    app.register("alice").await;

    let response = app
        .post_form(
            "/login",
            None,
            &[
                ("username", "alice"),
                ("password", common::PASSWORD),
                ("next", "/profile"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/profile"));

    let profile = app.get_page("/profile", Some(&response.cookie_header())).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert!(profile.body.contains("Login successful!"));
    assert!(profile.body.contains("alice"));
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let app = TestApp::new();
    app.register("alice").await;

    let response = app
        .post_form(
            "/login",
            None,
            &[
                ("username", "alice"),
                ("password", common::PASSWORD),
                ("next", "//evil.example.com"),
            ],
        )
        .await;
    assert_eq!(response.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_bad_login_rerenders_form() {
    let app = TestApp::new();
    app.register("alice").await;

    let response = app
        .post_form(
            "/login",
            None,
            &[("username", "alice"), ("password", "wrong"), ("next", "")],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Invalid username or password."));
}

#[tokio::test]
async fn test_register_page_flow() {
    let app = TestApp::new();
    let form = [
        ("username", "bob"),
        ("email", "bob@example.com"),
        ("full_name", "Bob Builder"),
        ("password1", common::PASSWORD),
        ("password2", "something-else"),
    ];

    let mismatch = app.post_form("/register", None, &form).await;
    assert_eq!(mismatch.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(mismatch.body.contains("didn"));

    let mut form = form;
    form[4] = ("password2", common::PASSWORD);
    let ok = app.post_form("/register", None, &form).await;
    assert_eq!(ok.status, StatusCode::SEE_OTHER);
    assert!(ok.cookies.iter().any(|c| c.starts_with("eventhub_session=")));
}

#[tokio::test]
async fn test_create_form_rejects_end_before_start() {
    let app = TestApp::new();
    let session = login(&app, "organizer").await;

    let response = app
        .post_form(
            "/events/create",
            Some(&session),
            &[
                ("title", "Backwards"),
                ("description", ""),
                ("location", "Hall"),
                ("start_time", "2030-05-01T18:00"),
                ("end_time", "2030-05-01T17:00"),
                ("is_public", "on"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("End time must be after start time."));
}

#[tokio::test]
async fn test_create_then_view_private_event() {
    let app = TestApp::new();
    let session = login(&app, "organizer").await;

    let created = app
        .post_form(
            "/events/create",
            Some(&session),
            &[
                ("title", "Quiet Planning"),
                ("description", "Invite only"),
                ("location", "Back room"),
                ("start_time", "2030-05-01T18:00"),
                ("end_time", "2030-05-01T20:00"),
            ],
        )
        .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    let location = created.location.clone().unwrap();
    assert!(location.starts_with("/events/"));

    let cookies = format!("{}; {}", session, created.cookie_header());
    let own = app.get_page(&location, Some(&cookies)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert!(own.body.contains("Quiet Planning"));
    assert!(own.body.contains("Event created successfully!"));

    let anonymous = app.get_page(&location, None).await;
    assert_eq!(anonymous.status, StatusCode::NOT_FOUND);

    let stranger = login(&app, "stranger").await;
    let uninvited = app.get_page(&location, Some(&stranger)).await;
    assert_eq!(uninvited.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_organizer_cannot_open_edit_form() {
    let app = TestApp::new();
    let organizer = app.register("organizer").await;
    let id = app.create_event(&organizer, "Potluck", true).await;
    let other = login(&app, "other").await;

    let response = app
        .get_page(&format!("/events/{id}/edit"), Some(&other))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rsvp_form_redirects_with_flash() {
    let app = TestApp::new();
    let organizer = app.register("organizer").await;
    let id = app.create_event(&organizer, "Potluck", true).await;
    let guest = login(&app, "guest").await;

    let response = app
        .post_form(
            &format!("/events/{id}/rsvp"),
            Some(&guest),
            &[("status", "Maybe")],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let cookies = format!("{}; {}", guest, response.cookie_header());
    let detail = app.get_page(&format!("/events/{id}"), Some(&cookies)).await;
    assert!(detail.body.contains("RSVP updated to"));
    assert!(detail.body.contains("Maybe"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = TestApp::new();
    let session = login(&app, "alice").await;

    let response = app.post_form("/logout", Some(&session), &[]).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(response
        .cookies
        .iter()
        .any(|c| c == "eventhub_session=" || c.starts_with("eventhub_session=;")));
}

#[tokio::test]
async fn test_review_form_validates_and_submits() {
    let app = TestApp::new();
    let organizer = app.register("organizer").await;
    let id = app.create_event(&organizer, "Book club", true).await;
    let guest = login(&app, "guest").await;
    let uri = format!("/events/{id}/review");

    let out_of_range = app
        .post_form(&uri, Some(&guest), &[("rating", "9"), ("comment", "Fine")])
        .await;
    assert_eq!(out_of_range.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(out_of_range.body.contains("Rating must be between 1 and 5."));
    assert!(out_of_range.body.contains("Book club"));

    let not_a_number = app
        .post_form(&uri, Some(&guest), &[("rating", "five"), ("comment", "Fine")])
        .await;
    assert_eq!(not_a_number.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(not_a_number.body.contains("A valid integer is required."));

    let blank = app
        .post_form(&uri, Some(&guest), &[("rating", "4"), ("comment", "  ")])
        .await;
    assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(blank.body.contains("This field may not be blank."));

    let submitted = app
        .post_form(&uri, Some(&guest), &[("rating", "4"), ("comment", "Lively debate")])
        .await;
    assert_eq!(submitted.status, StatusCode::SEE_OTHER);
    assert_eq!(submitted.location, Some(format!("/events/{id}")));

    let cookies = format!("{}; {}", guest, submitted.cookie_header());
    let detail = app.get_page(&format!("/events/{id}"), Some(&cookies)).await;
    assert!(detail.body.contains("Review submitted successfully!"));
    assert!(detail.body.contains("Lively debate"));
}

#[tokio::test]
async fn test_review_delete_form_only_removes_own_review_of_that_event() {
    let app = TestApp::new();
    let organizer = app.register("organizer").await;
    let first = app.create_event(&organizer, "Book club", true).await;
    let second = app.create_event(&organizer, "Film night", true).await;

    let author_token = app.register("author").await;
    let created = app
        .api(
            axum::http::Method::POST,
            &format!("/api/events/{first}/reviews"),
            Some(&author_token),
            Some(serde_json::json!({ "rating": 5, "comment": "Great picks" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let review_id = created.json()["data"]["id"].as_str().unwrap().to_string();
    let form = [("review_id", review_id.as_str())];

    let other = login(&app, "other").await;
    let not_theirs = app
        .post_form(&format!("/events/{first}/review/delete"), Some(&other), &form)
        .await;
    assert_eq!(not_theirs.status, StatusCode::NOT_FOUND);

    let author = session_for(&app, "author").await;
    let wrong_event = app
        .post_form(&format!("/events/{second}/review/delete"), Some(&author), &form)
        .await;
    assert_eq!(wrong_event.status, StatusCode::NOT_FOUND);

    let deleted = app
        .post_form(&format!("/events/{first}/review/delete"), Some(&author), &form)
        .await;
    assert_eq!(deleted.status, StatusCode::SEE_OTHER);
    assert_eq!(deleted.location, Some(format!("/events/{first}")));

    let cookies = format!("{}; {}", author, deleted.cookie_header());
    let detail = app.get_page(&format!("/events/{first}"), Some(&cookies)).await;
    assert!(detail.body.contains("Review deleted successfully!"));
    assert!(!detail.body.contains("Great picks"));
}

#[tokio::test]
async fn test_profile_edit_flow() {
    let app = TestApp::new();
    let session = login(&app, "alice").await;

    let form_page = app.get_page("/profile/edit", Some(&session)).await;
    assert_eq!(form_page.status, StatusCode::OK);
    assert!(form_page.body.contains(r#"value="alice""#));

    let blank = app
        .post_form(
            "/profile/edit",
            Some(&session),
            &[("full_name", " "), ("bio", ""), ("location", ""), ("profile_picture", "")],
        )
        .await;
    assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(blank.body.contains("This field may not be blank."));

    let bad_picture = app
        .post_form(
            "/profile/edit",
            Some(&session),
            &[
                ("full_name", "Alice"),
                ("bio", ""),
                ("location", ""),
                ("profile_picture", "not a url"),
            ],
        )
        .await;
    assert_eq!(bad_picture.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(bad_picture.body.contains("Enter a valid URL."));

    let saved = app
        .post_form(
            "/profile/edit",
            Some(&session),
            &[
                ("full_name", "Alice Liddell"),
                ("bio", "Curious"),
                ("location", "Lisbon"),
                ("profile_picture", ""),
            ],
        )
        .await;
    assert_eq!(saved.status, StatusCode::SEE_OTHER);
    assert_eq!(saved.location.as_deref(), Some("/profile"));

    let cookies = format!("{}; {}", session, saved.cookie_header());
    let profile = app.get_page("/profile", Some(&cookies)).await;
    assert!(profile.body.contains("Profile updated successfully!"));
    assert!(profile.body.contains("Lisbon"));
    assert!(profile.body.contains("Alice Liddell"));
}

#[tokio::test]
async fn test_profile_edit_requires_login() {
    let app = TestApp::new();
    let response = app.get_page("/profile/edit", None).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/login?next=/profile/edit"));
}
