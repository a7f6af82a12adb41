use std::sync::Arc;

use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{LoginRequest, SignupRequest, User};
use crate::repository::UserRepository;
use crate::security::password::{hash_password_blocking, verify_password_blocking};
use crate::security::TokenCodec;
use crate::AppState;

/// Account signup and login; both hand back a fresh session token.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenCodec,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenCodec) -> Self {
        Self { users, tokens }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.tokens.clone())
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<String> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.users.get_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::Validation(
                "a user with this email already exists".to_string(),
            ));
        }
        if self
            .users
            .get_user_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(
                "a user with this username already exists".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(request.password).await?;
        let name = request.name.filter(|n| !n.trim().is_empty());
        let user = User::new(name, request.username, request.email, password_hash);
        self.users.create_user(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");

        self.issue_token(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<String> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let user = self
            .users
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("could not find a user with this email/password".to_string())
            })?;

        if !verify_password_blocking(request.password, user.password_hash.clone()).await? {
            tracing::info!(user_id = %user.id, "login rejected: wrong password");
            return Err(AppError::CredentialMismatch(
                "wrong email or password".to_string(),
            ));
        }

        tracing::info!(user_id = %user.id, "user logged in");

        self.issue_token(&user)
    }

    fn issue_token(&self, user: &User) -> Result<String> {
        self.tokens
            .issue(user.id)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("token issuance failed: {e}")))
    }
}
