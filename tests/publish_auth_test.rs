//! Media server publish callback, end to end over HTTP.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{test_config, TestApp, INGEST_BASE};
use livestream_api::repository::LiveStreamRepository;
use tokio_test::assert_ok;
use url::form_urlencoded;

fn tcurl(username: &str, password: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("username", username)
        .append_pair("password", password)
        .finish();
    format!("rtmp://localhost:1935/live?{query}")
}

fn validate_uri(stream_key: &str, username: &str, password: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("name", stream_key)
        .append_pair("tcurl", &tcurl(username, password))
        .finish();
    format!("/livestream/validate?{query}")
}

async fn setup(app: &TestApp) -> (String, String) {
    let token = app.signup("bob", "secret").await;
    app.create_stream(&token, "Bob live").await
}

#[tokio::test]
async fn test_grant_redirects_to_ingest_address() {
    let app = TestApp::new();
    let (stream_id, stream_key) = setup(&app).await;

    let response = app
        .request(
            Method::GET,
            &validate_uri(&stream_key, "bob", "secret"),
            None,
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.location.as_deref(),
        Some(format!("{INGEST_BASE}/{stream_id}").as_str())
    );
}

#[tokio::test]
async fn test_denials_carry_reason() {
    let app = TestApp::new();
    let (_, stream_key) = setup(&app).await;

    let cases = [
        (stream_key.as_str(), "", "secret", "missing username/password combination"),
        (stream_key.as_str(), "bob", "", "missing username/password combination"),
        (stream_key.as_str(), "nouser", "whatever", "invalid username"),
        (stream_key.as_str(), "bob", "wrong", "incorrect password"),
        ("nonexistent", "bob", "secret", "invalid stream key"),
    ];

    for (key, username, password, reason) in cases {
        let response = app
            .request(Method::GET, &validate_uri(key, username, password), None, None)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{username}/{password}");
        assert_eq!(response.message(), reason);
        assert!(response.location.is_none());
    }
}

#[tokio::test]
async fn test_bad_password_hides_key_validity() {
    let app = TestApp::new();
    let (_, stream_key) = setup(&app).await;

    let with_valid_key = app
        .request(Method::GET, &validate_uri(&stream_key, "bob", "wrong"), None, None)
        .await;
    let with_bogus_key = app
        .request(Method::GET, &validate_uri("nonexistent", "bob", "wrong"), None, None)
        .await;

    assert_eq!(with_valid_key.status, with_bogus_key.status);
    assert_eq!(with_valid_key.message(), with_bogus_key.message());
}

#[tokio::test]
async fn test_form_post_from_media_server() {
    let app = TestApp::new();
    let (stream_id, stream_key) = setup(&app).await;

    let body = form_urlencoded::Serializer::new(String::new())
        .append_pair("app", "live")
        .append_pair("name", &stream_key)
        .append_pair("tcurl", "rtmp://localhost:1935/live")
        .append_pair("swfurl", &tcurl("bob", "secret"))
        .finish();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/livestream/validate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert!(response.location.unwrap().ends_with(&stream_id));
}

#[tokio::test]
async fn test_foreign_stream_key_denied_when_ownership_enforced() {
    let app = TestApp::new();
    let (_, bob_key) = setup(&app).await;
    app.signup("alice", "hunter2").await;

    let response = app
        .request(Method::GET, &validate_uri(&bob_key, "alice", "hunter2"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "invalid stream key");
}

#[tokio::test]
async fn test_foreign_stream_key_granted_without_ownership_check() {
    let app = TestApp::with_config(test_config(false));
    let (stream_id, bob_key) = setup(&app).await;
    app.signup("alice", "hunter2").await;

    let response = app
        .request(Method::GET, &validate_uri(&bob_key, "alice", "hunter2"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert!(response.location.unwrap().ends_with(&stream_id));
}

#[tokio::test]
async fn test_deleted_stream_key_stops_working() {
    let app = TestApp::new();
    let token = app.signup("bob", "secret").await;
    let (stream_id, stream_key) = app.create_stream(&token, "Bob live").await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/livestream/delete/{stream_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(Method::GET, &validate_uri(&stream_key, "bob", "secret"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "invalid stream key");
}

#[tokio::test]
async fn test_repeated_calls_agree() {
    let app = TestApp::new();
    let (_, stream_key) = setup(&app).await;
    let uri = validate_uri(&stream_key, "bob", "secret");

    let first = app.request(Method::GET, &uri, None, None).await;
    let second = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(first.status, second.status);
    assert_eq!(first.location, second.location);

    // The handshake never mutates the stream.
    let stream = assert_ok!(app.state.streams.get_live_stream_by_key(&stream_key).await);
    assert!(!stream.unwrap().is_live);
}

#[tokio::test]
async fn test_unparseable_connection_url() {
    let app = TestApp::new();
    let (_, stream_key) = setup(&app).await;

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("name", &stream_key)
        .append_pair("tcurl", "::not a url::")
        .finish();
    let response = app
        .request(Method::GET, &format!("/livestream/validate?{query}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().starts_with("invalid connection url"));
}

#[tokio::test]
async fn test_storage_failure_is_server_error() {
    let app = TestApp::with_unavailable_users();

    let response = app
        .request(Method::GET, &validate_uri("key123", "bob", "secret"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.message(), "failed to process request");
    assert!(!response.body.to_string().contains("10.0.0.3"));
    assert!(response.location.is_none());
}
