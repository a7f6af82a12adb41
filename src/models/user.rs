use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Database row for the users table. Carries the password hash, so it is
/// never serialized directly; use [`UserProfile`] for responses.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: Option<String>, username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            username,
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "invalid email"), length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email"), length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Partial profile update; at least one field must be present.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub username: Option<String>,
    #[validate(email(message = "invalid email"), length(max = 255))]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Field changes applied by the repository. The password arrives here
/// already hashed.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
