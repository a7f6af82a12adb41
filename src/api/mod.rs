mod livestreams;
mod publish;
mod users;

use axum::{extract::rejection::JsonRejection, Json, Router};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::AppState;

pub use publish::{extract_credentials, PublishParams};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/user", users::routes(state.clone()))
        .nest("/livestream", livestreams::routes(state))
}

/// Parse a path identifier, answering with a JSON 400 instead of axum's
/// plain-text rejection.
fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("invalid id: {raw}")))
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(format!("could not parse body: {}", e.body_text())))
}
