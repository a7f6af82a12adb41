use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use super::{json_body, parse_id};
use crate::error::Result;
use crate::middleware::{require_auth, CurrentUser};
use crate::models::{LoginRequest, SignupRequest, TokenResponse, UpdateUserRequest};
use crate::services::{AuthService, UserService};
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/delete", delete(delete_user))
        .route("/update", patch(update_user))
        .route("/follow/:id", post(follow_user))
        .route("/unfollow/:id", delete(unfollow_user))
        .route("/:id", get(get_user_profile))
        .route("/:id/followers", get(list_followers))
        .route("/:id/following", get(list_following))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/all", get(get_all_users))
        .merge(protected)
}

async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let request = json_body(payload)?;
    let token = AuthService::from_state(&state).login(request).await?;
    Ok(Json(TokenResponse { token }))
}

async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let request = json_body(payload)?;
    let token = AuthService::from_state(&state).signup(request).await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

async fn get_all_users(State(state): State<AppState>) -> Result<Json<Value>> {
    let users = UserService::from_state(&state).list_users().await?;
    Ok(Json(json!({ "users": users })))
}

async fn get_user_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let user = UserService::from_state(&state)
        .get_profile(parse_id(&id)?)
        .await?;
    Ok(Json(json!({ "user": user })))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    payload: std::result::Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = json_body(payload)?;
    let user = UserService::from_state(&state)
        .update_user(current_user.id, request)
        .await?;
    Ok(Json(json!({ "user": user })))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<Value>> {
    UserService::from_state(&state)
        .delete_user(current_user.id)
        .await?;
    Ok(Json(json!({ "message": "user deleted" })))
}

async fn follow_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let created = UserService::from_state(&state)
        .follow(current_user.id, parse_id(&id)?)
        .await?;
    let message = if created { "followed" } else { "already following" };
    Ok(Json(json!({ "message": message })))
}

async fn unfollow_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    UserService::from_state(&state)
        .unfollow(current_user.id, parse_id(&id)?)
        .await?;
    Ok(Json(json!({ "message": "unfollowed" })))
}

async fn list_followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let users = UserService::from_state(&state)
        .followers(parse_id(&id)?)
        .await?;
    Ok(Json(json!({ "users": users })))
}

async fn list_following(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let users = UserService::from_state(&state)
        .following(parse_id(&id)?)
        .await?;
    Ok(Json(json!({ "users": users })))
}
