//! Shared helpers for the HTTP-level tests.
//!
//! Every test gets a fresh router over its own in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use livestream_api::config::{Config, DatabaseConfig, JwtConfig, PublishConfig, ServerConfig};
use livestream_api::models::{User, UserChanges};
use livestream_api::repository::memory::InMemoryStore;
use livestream_api::repository::UserRepository;
use livestream_api::{build_router, AppState};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const INGEST_BASE: &str = "rtmp://127.0.0.1/hls-live";

pub fn test_config(enforce_ownership: bool) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiry_hours: 5,
        },
        publish: PublishConfig {
            ingest_base_url: INGEST_BASE.to_string(),
            enforce_ownership,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(true))
    }

    pub fn with_config(config: Config) -> Self {
        Self::from_state(AppState::in_memory(config))
    }

    /// User storage always fails; streams and follows stay in memory.
    pub fn with_unavailable_users() -> Self {
        let store = InMemoryStore::new();
        Self::from_state(AppState::new(
            test_config(true),
            Arc::new(UnavailableUsers),
            Arc::new(store.clone()),
            Arc::new(store),
        ))
    }

    pub fn from_state(state: AppState) -> Self {
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            location,
            body,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        self.send(request).await
    }

    /// Sign up a user with `<username>@example.com` and return its token.
    pub async fn signup(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/user/signup",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": password,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["token"]
            .as_str()
            .expect("token in signup response")
            .to_string()
    }

    /// Create a stream and return `(stream_id, stream_key)`.
    pub async fn create_stream(&self, token: &str, name: &str) -> (String, String) {
        let response = self
            .request(
                Method::POST,
                "/livestream/create",
                Some(token),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        (
            response.body["stream_id"].as_str().unwrap().to_string(),
            response.body["stream_key"].as_str().unwrap().to_string(),
        )
    }

    pub fn user_id(&self, token: &str) -> Uuid {
        self.state.tokens.verify(token).expect("valid token")
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

pub struct UnavailableUsers;

#[async_trait]
impl UserRepository for UnavailableUsers {
    async fn create_user(&self, _: &User) -> anyhow::Result<()> {
        anyhow::bail!("connection refused on 10.0.0.3:5432")
    }
    async fn get_user_by_id(&self, _: Uuid) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused on 10.0.0.3:5432")
    }
    async fn get_user_by_email(&self, _: &str) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused on 10.0.0.3:5432")
    }
    async fn get_user_by_username(&self, _: &str) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused on 10.0.0.3:5432")
    }
    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        anyhow::bail!("connection refused on 10.0.0.3:5432")
    }
    async fn update_user(&self, _: Uuid, _: &UserChanges) -> anyhow::Result<Option<User>> {
        anyhow::bail!("connection refused on 10.0.0.3:5432")
    }
    async fn delete_user(&self, _: Uuid) -> anyhow::Result<bool> {
        anyhow::bail!("connection refused on 10.0.0.3:5432")
    }
}
