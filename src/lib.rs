//! Livestream platform API.
//!
//! Account management, follows and stream management behind bearer session
//! tokens, plus the publish callback a media ingest server uses to decide
//! whether to accept a publisher.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod security;
pub mod services;

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::repository::memory::InMemoryStore;
use crate::repository::{
    FollowRepository, LiveStreamRepository, PgFollowRepository, PgLiveStreamRepository,
    PgUserRepository, UserRepository,
};
use crate::security::TokenCodec;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: TokenCodec,
    pub users: Arc<dyn UserRepository>,
    pub streams: Arc<dyn LiveStreamRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserRepository>,
        streams: Arc<dyn LiveStreamRepository>,
        follows: Arc<dyn FollowRepository>,
    ) -> Self {
        let ttl = chrono::Duration::hours(config.jwt.expiry_hours as i64);
        let tokens = TokenCodec::new(&config.jwt.secret, ttl);

        Self {
            config: Arc::new(config),
            tokens,
            users,
            streams,
            follows,
        }
    }

    pub fn postgres(config: Config, pool: PgPool) -> Self {
        Self::new(
            config,
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgLiveStreamRepository::new(pool.clone())),
            Arc::new(PgFollowRepository::new(pool)),
        )
    }

    /// All three repositories backed by one shared in-memory store.
    pub fn in_memory(config: Config) -> Self {
        let store = InMemoryStore::new();
        Self::new(
            config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(api::routes(state.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
