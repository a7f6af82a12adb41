use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

pub const MISSING_CREDENTIAL: &str = "missing credential";
pub const MALFORMED_CREDENTIAL: &str = "malformed credential";

/// The authenticated caller, attached to request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
}

/// Pull the bearer token out of an `Authorization: Bearer <token>` header.
///
/// The header must split into exactly two space-separated parts, the first
/// being the `Bearer` scheme (case-insensitive).
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized(MISSING_CREDENTIAL.to_string()))?;

    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized(MALFORMED_CREDENTIAL.to_string()))?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => Ok(*token),
        _ => Err(AppError::Unauthorized(MALFORMED_CREDENTIAL.to_string())),
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = {
        let token = extract_bearer(request.headers())?;
        state.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            AppError::Unauthorized(format!("invalid token: {e}"))
        })?
    };

    request.extensions_mut().insert(CurrentUser { id: user_id });

    Ok(next.run(request).await)
}
