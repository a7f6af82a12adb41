use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::LiveStreamRepository;
use crate::models::{LiveStream, LiveStreamChanges};

const STREAM_COLUMNS: &str =
    "id, name, stream_key, publisher_id, viewer_count, is_live, created_at, updated_at";

/// PostgreSQL repository for the live_streams table.
/// Pure data access, no business logic.
#[derive(Clone)]
pub struct PgLiveStreamRepository {
    pool: PgPool,
}

impl PgLiveStreamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LiveStreamRepository for PgLiveStreamRepository {
    async fn create_live_stream(&self, stream: &LiveStream) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO live_streams (
                id, name, stream_key, publisher_id, viewer_count, is_live, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(stream.id)
        .bind(&stream.name)
        .bind(&stream.stream_key)
        .bind(stream.publisher_id)
        .bind(stream.viewer_count)
        .bind(stream.is_live)
        .bind(stream.created_at)
        .bind(stream.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert stream")?;

        Ok(())
    }

    async fn get_live_stream_by_id(&self, id: Uuid) -> Result<Option<LiveStream>> {
        let query = format!("SELECT {STREAM_COLUMNS} FROM live_streams WHERE id = $1");
        let stream = sqlx::query_as::<_, LiveStream>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch stream by ID")?;

        Ok(stream)
    }

    async fn get_live_stream_by_key(&self, stream_key: &str) -> Result<Option<LiveStream>> {
        let query = format!("SELECT {STREAM_COLUMNS} FROM live_streams WHERE stream_key = $1");
        let stream = sqlx::query_as::<_, LiveStream>(&query)
            .bind(stream_key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch stream by key")?;

        Ok(stream)
    }

    async fn list_by_publisher(&self, publisher_id: Uuid) -> Result<Vec<LiveStream>> {
        let query = format!(
            "SELECT {STREAM_COLUMNS} FROM live_streams WHERE publisher_id = $1 ORDER BY created_at DESC"
        );
        let streams = sqlx::query_as::<_, LiveStream>(&query)
            .bind(publisher_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list streams by publisher")?;

        Ok(streams)
    }

    async fn list_feed(&self, limit: i64) -> Result<Vec<LiveStream>> {
        let query = format!(
            r#"
            SELECT {STREAM_COLUMNS} FROM live_streams
            ORDER BY is_live DESC, viewer_count DESC, created_at DESC
            LIMIT $1
            "#
        );
        let streams = sqlx::query_as::<_, LiveStream>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list stream feed")?;

        Ok(streams)
    }

    async fn update_live_stream(
        &self,
        id: Uuid,
        changes: &LiveStreamChanges,
    ) -> Result<Option<LiveStream>> {
        let query = format!(
            r#"
            UPDATE live_streams SET
                name = COALESCE($2, name),
                is_live = COALESCE($3, is_live),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {STREAM_COLUMNS}
            "#
        );
        let stream = sqlx::query_as::<_, LiveStream>(&query)
            .bind(id)
            .bind(&changes.name)
            .bind(changes.is_live)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update stream")?;

        Ok(stream)
    }

    async fn delete_live_stream(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM live_streams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete stream")?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_by_publisher(&self, publisher_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM live_streams WHERE publisher_id = $1")
            .bind(publisher_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete streams by publisher")?;

        Ok(result.rows_affected())
    }
}
