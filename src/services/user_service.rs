use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{UpdateUserRequest, User, UserChanges, UserProfile};
use crate::repository::{FollowRepository, LiveStreamRepository, UserRepository};
use crate::security::password::hash_password_blocking;
use crate::AppState;

pub struct UserService {
    users: Arc<dyn UserRepository>,
    streams: Arc<dyn LiveStreamRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        streams: Arc<dyn LiveStreamRepository>,
        follows: Arc<dyn FollowRepository>,
    ) -> Self {
        Self {
            users,
            streams,
            follows,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.streams.clone(), state.follows.clone())
    }

    async fn require_user(&self, id: Uuid) -> Result<User> {
        self.users
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("a user with this id does not exist".to_string()))
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<UserProfile> {
        Ok(self.require_user(id).await?.into())
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let users = self.users.list_users().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn update_user(&self, id: Uuid, request: UpdateUserRequest) -> Result<UserProfile> {
        if request.is_empty() {
            return Err(AppError::Validation("need one update parameter".to_string()));
        }
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.require_user(id).await?;

        if let Some(username) = &request.username {
            if let Some(existing) = self.users.get_user_by_username(username).await? {
                if existing.id != id {
                    return Err(AppError::Validation(
                        "a user with this username already exists".to_string(),
                    ));
                }
            }
        }
        if let Some(email) = &request.email {
            if let Some(existing) = self.users.get_user_by_email(email).await? {
                if existing.id != id {
                    return Err(AppError::Validation(
                        "a user with this email already exists".to_string(),
                    ));
                }
            }
        }

        let password_hash = match request.password {
            Some(password) => Some(hash_password_blocking(password).await?),
            None => None,
        };

        let changes = UserChanges {
            name: request.name,
            username: request.username,
            email: request.email,
            password_hash,
        };

        let user = self
            .users
            .update_user(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("a user with this id does not exist".to_string()))?;

        tracing::info!(user_id = %id, "user updated");
        Ok(user.into())
    }

    /// Delete a user together with every stream it publishes and every follow
    /// edge it takes part in.
    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        self.require_user(id).await?;

        let streams_removed = self.streams.delete_by_publisher(id).await?;
        let follows_removed = self.follows.delete_all_for_user(id).await?;

        if !self.users.delete_user(id).await? {
            return Err(AppError::NotFound(
                "a user with this id does not exist".to_string(),
            ));
        }

        tracing::info!(
            user_id = %id,
            streams_removed,
            follows_removed,
            "user deleted"
        );
        Ok(())
    }

    pub async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        if follower_id == followee_id {
            return Err(AppError::Validation("cannot follow yourself".to_string()));
        }
        self.require_user(follower_id).await?;
        self.require_user(followee_id).await?;

        let created = self.follows.follow(follower_id, followee_id).await?;
        if created {
            tracing::debug!(%follower_id, %followee_id, "follow created");
        }
        Ok(created)
    }

    pub async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        if !self.follows.unfollow(follower_id, followee_id).await? {
            return Err(AppError::NotFound("not following this user".to_string()));
        }
        Ok(())
    }

    pub async fn followers(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        self.require_user(user_id).await?;
        let users = self.follows.list_followers(user_id).await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn following(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        self.require_user(user_id).await?;
        let users = self.follows.list_following(user_id).await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }
}
