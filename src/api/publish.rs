//! Media server publish callback.
//!
//! nginx-rtmp style servers call back with the stream key in `name` and the
//! publisher's connection URL in `tcurl` (or `swfurl`). The username and
//! password travel in that URL's query string.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::error::{AppError, Result};
use crate::services::{PublishAuthorizer, PublishDecision};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PublishParams {
    /// Stream key.
    pub name: Option<String>,
    pub tcurl: Option<String>,
    pub swfurl: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Pull `(username, password)` out of the callback parameters.
///
/// nginx-rtmp always sends `tcurl`, so the credentials come from the first
/// of `tcurl`, `swfurl` whose query actually carries them. Plain
/// `username`/`password` parameters are the last resort. Missing values come
/// back empty and are rejected by the handshake itself.
pub fn extract_credentials(params: &PublishParams) -> Result<(String, String)> {
    let connection_urls = [params.tcurl.as_deref(), params.swfurl.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|raw| !raw.is_empty());

    for raw in connection_urls {
        let url = Url::parse(raw)
            .map_err(|e| AppError::Validation(format!("invalid connection url: {e}")))?;
        if let Some(credentials) = credentials_in_query(&url) {
            return Ok(credentials);
        }
    }

    Ok((
        params.username.clone().unwrap_or_default(),
        params.password.clone().unwrap_or_default(),
    ))
}

fn credentials_in_query(url: &Url) -> Option<(String, String)> {
    let mut username = None;
    let mut password = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "username" => username = Some(value.into_owned()),
            "password" => password = Some(value.into_owned()),
            _ => {}
        }
    }

    if username.is_none() && password.is_none() {
        return None;
    }
    Some((username.unwrap_or_default(), password.unwrap_or_default()))
}

pub(super) async fn validate_publish_query(
    State(state): State<AppState>,
    Query(params): Query<PublishParams>,
) -> Result<Response> {
    validate_publish(&state, params).await
}

pub(super) async fn validate_publish_form(
    State(state): State<AppState>,
    Form(params): Form<PublishParams>,
) -> Result<Response> {
    validate_publish(&state, params).await
}

async fn validate_publish(state: &AppState, params: PublishParams) -> Result<Response> {
    let (username, password) = extract_credentials(&params)?;
    let stream_key = params.name.unwrap_or_default();

    let decision = PublishAuthorizer::from_state(state)
        .authorize(&stream_key, &username, &password)
        .await
        .map_err(AppError::Internal)?;

    let response = match decision {
        PublishDecision::Granted { location, .. } => {
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        PublishDecision::Denied(reason) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": reason.message() })),
        )
            .into_response(),
    };

    Ok(response)
}
