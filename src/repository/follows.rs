use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::FollowRepository;
use crate::models::User;

/// PostgreSQL repository for the follows table
#[derive(Clone)]
pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followee_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.pool)
        .await
        .context("Failed to create follow")?;

        debug!("Created follow: {} -> {}", follower_id, followee_id);
        Ok(result.rows_affected() == 1)
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete follow")?;

        debug!("Deleted follow: {} -> {}", follower_id, followee_id);
        Ok(result.rows_affected() == 1)
    }

    async fn list_followers(&self, user_id: Uuid) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.username, u.email, u.password_hash, u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followee_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list followers")?;

        Ok(users)
    }

    async fn list_following(&self, user_id: Uuid) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.username, u.email, u.password_hash, u.created_at, u.updated_at
            FROM follows f
            JOIN users u ON u.id = f.followee_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list following")?;

        Ok(users)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 OR followee_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete follows for user")?;

        Ok(result.rows_affected())
    }
}
