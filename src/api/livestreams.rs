use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{json_body, parse_id, publish};
use crate::error::Result;
use crate::middleware::{require_auth, CurrentUser};
use crate::models::{CreateLiveStreamRequest, CreateLiveStreamResponse, UpdateLiveStreamParams};
use crate::services::StreamService;
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/create", post(create_live_stream))
        .route("/info/:id", get(get_live_stream_data))
        .route("/user/:user_id", get(get_user_live_streams))
        .route("/update/:id", patch(update_live_stream))
        .route("/delete/:id", delete(delete_live_stream))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/feed", get(get_live_stream_feed))
        // Called by the media server, authenticated by stream key + credentials
        .route(
            "/validate",
            get(publish::validate_publish_query).post(publish::validate_publish_form),
        )
        .merge(protected)
}

async fn create_live_stream(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    payload: std::result::Result<Json<CreateLiveStreamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateLiveStreamResponse>)> {
    let request = json_body(payload)?;
    let created = StreamService::from_state(&state)
        .create_stream(current_user.id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_live_stream_data(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let livestream = StreamService::from_state(&state)
        .get_stream(parse_id(&id)?, current_user.id)
        .await?;
    Ok(Json(json!({ "livestream": livestream })))
}

async fn get_user_live_streams(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    let livestreams = StreamService::from_state(&state)
        .list_user_streams(parse_id(&user_id)?, current_user.id)
        .await?;
    Ok(Json(json!({ "livestreams": livestreams })))
}

#[derive(Debug, Deserialize)]
struct FeedParams {
    q: Option<String>,
}

async fn get_live_stream_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<Json<Value>> {
    let livestreams = StreamService::from_state(&state)
        .feed(params.q.as_deref())
        .await?;
    Ok(Json(json!({ "livestreams": livestreams })))
}

async fn update_live_stream(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Query(params): Query<UpdateLiveStreamParams>,
) -> Result<Json<Value>> {
    let livestream = StreamService::from_state(&state)
        .update_stream(parse_id(&id)?, current_user.id, params)
        .await?;
    Ok(Json(json!({ "message": "success", "livestream": livestream })))
}

async fn delete_live_stream(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    StreamService::from_state(&state)
        .delete_stream(parse_id(&id)?, current_user.id)
        .await?;
    Ok(Json(json!({ "message": "success" })))
}
