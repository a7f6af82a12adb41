use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DuplicateUser, UserRepository};
use crate::models::{User, UserChanges};

const USER_COLUMNS: &str = "id, name, username, email, password_hash, created_at, updated_at";

/// PostgreSQL repository for the users table
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn get_user_where(&self, column: &str, value: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch user by {column}"))?;

        Ok(user)
    }
}

/// Turn a unique violation on `username`/`email` into [`DuplicateUser`];
/// anything else stays a storage fault.
fn map_write_error(err: sqlx::Error, action: &'static str) -> anyhow::Error {
    let field = err
        .as_database_error()
        .filter(|db_err| db_err.is_unique_violation())
        .and_then(|db_err| match db_err.constraint() {
            Some(c) if c.contains("username") => Some("username"),
            Some(c) if c.contains("email") => Some("email"),
            _ => None,
        });

    match field {
        Some(field) => DuplicateUser { field }.into(),
        None => anyhow::Error::new(err).context(action),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, username, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to insert user"))?;

        Ok(())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by id")?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_where("email", email).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_where("username", username).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        Ok(users)
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> Result<Option<User>> {
        let query = format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                username = COALESCE($3, username),
                email = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.username)
            .bind(&changes.email)
            .bind(&changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "Failed to update user"))?;

        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() == 1)
    }
}
