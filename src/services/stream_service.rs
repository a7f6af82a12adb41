//! Stream management (business logic layer)
//!
//! Every mutating operation is restricted to the stream's publisher.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{
    CreateLiveStreamRequest, CreateLiveStreamResponse, LiveStream, LiveStreamChanges,
    LiveStreamView, UpdateLiveStreamParams,
};
use crate::repository::{LiveStreamRepository, UserRepository};
use crate::AppState;

pub const DEFAULT_FEED_SIZE: i64 = 10;
pub const MAX_FEED_SIZE: i64 = 100;

pub struct StreamService {
    users: Arc<dyn UserRepository>,
    streams: Arc<dyn LiveStreamRepository>,
}

impl StreamService {
    pub fn new(users: Arc<dyn UserRepository>, streams: Arc<dyn LiveStreamRepository>) -> Self {
        Self { users, streams }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.streams.clone())
    }

    pub async fn create_stream(
        &self,
        publisher_id: Uuid,
        request: CreateLiveStreamRequest,
    ) -> Result<CreateLiveStreamResponse> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.users.get_user_by_id(publisher_id).await?.is_none() {
            return Err(AppError::NotFound(
                "a user with this id does not exist".to_string(),
            ));
        }

        let stream = LiveStream::new(request.name, publisher_id);
        self.streams.create_live_stream(&stream).await?;

        tracing::info!(stream_id = %stream.id, %publisher_id, "livestream created");

        Ok(CreateLiveStreamResponse {
            stream_id: stream.id,
            stream_key: stream.stream_key,
        })
    }

    pub async fn get_stream(&self, id: Uuid, viewer_id: Uuid) -> Result<LiveStreamView> {
        let stream = self.require_stream(id).await?;
        Ok(LiveStreamView::for_viewer(stream, Some(viewer_id)))
    }

    pub async fn list_user_streams(
        &self,
        publisher_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Vec<LiveStreamView>> {
        if self.users.get_user_by_id(publisher_id).await?.is_none() {
            return Err(AppError::NotFound(
                "a user with this id does not exist".to_string(),
            ));
        }

        let streams = self.streams.list_by_publisher(publisher_id).await?;
        Ok(streams
            .into_iter()
            .map(|s| LiveStreamView::for_viewer(s, Some(viewer_id)))
            .collect())
    }

    /// Public feed; `size` is the raw `q` query value.
    pub async fn feed(&self, size: Option<&str>) -> Result<Vec<LiveStreamView>> {
        let limit = parse_feed_size(size)?;
        let streams = self.streams.list_feed(limit).await?;
        Ok(streams
            .into_iter()
            .map(|s| LiveStreamView::for_viewer(s, None))
            .collect())
    }

    pub async fn update_stream(
        &self,
        id: Uuid,
        caller_id: Uuid,
        params: UpdateLiveStreamParams,
    ) -> Result<LiveStreamView> {
        params
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let status = params.status.filter(|s| !s.is_empty());
        let name = params.name.filter(|n| !n.trim().is_empty());
        if status.is_none() && name.is_none() {
            return Err(AppError::Validation("need one update parameter".to_string()));
        }

        let is_live = status
            .map(|s| {
                s.parse::<bool>()
                    .map_err(|_| AppError::Validation("invalid status value".to_string()))
            })
            .transpose()?;

        let stream = self.require_stream(id).await?;
        ensure_owner(&stream, caller_id)?;

        let changes = LiveStreamChanges { name, is_live };
        let updated = self
            .streams
            .update_live_stream(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("failed to find live stream".to_string()))?;

        tracing::info!(stream_id = %id, "livestream updated");
        Ok(LiveStreamView::for_viewer(updated, Some(caller_id)))
    }

    pub async fn delete_stream(&self, id: Uuid, caller_id: Uuid) -> Result<()> {
        let stream = self.require_stream(id).await?;
        ensure_owner(&stream, caller_id)?;

        if !self.streams.delete_live_stream(id).await? {
            return Err(AppError::NotFound("failed to find live stream".to_string()));
        }

        tracing::info!(stream_id = %id, "livestream deleted");
        Ok(())
    }

    async fn require_stream(&self, id: Uuid) -> Result<LiveStream> {
        self.streams
            .get_live_stream_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("failed to find live stream".to_string()))
    }
}

fn ensure_owner(stream: &LiveStream, caller_id: Uuid) -> Result<()> {
    if stream.publisher_id != caller_id {
        return Err(AppError::Forbidden(
            "only the publisher can modify this live stream".to_string(),
        ));
    }
    Ok(())
}

fn parse_feed_size(size: Option<&str>) -> Result<i64> {
    match size {
        None | Some("") => Ok(DEFAULT_FEED_SIZE),
        Some(raw) => {
            let n: i64 = raw
                .parse()
                .map_err(|_| AppError::Validation("invalid q value".to_string()))?;
            if n < 1 {
                return Err(AppError::Validation("invalid q value".to_string()));
            }
            Ok(n.min(MAX_FEED_SIZE))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::repository::memory::InMemoryStore;

    async fn setup() -> (StreamService, User, User) {
        let store = InMemoryStore::new();
        let bob = User::new(None, "bob".into(), "bob@example.com".into(), "hash".into());
        let alice = User::new(None, "alice".into(), "alice@example.com".into(), "hash".into());
        store.create_user(&bob).await.unwrap();
        store.create_user(&alice).await.unwrap();
        let service = StreamService::new(Arc::new(store.clone()), Arc::new(store));
        (service, bob, alice)
    }

    fn create(name: &str) -> CreateLiveStreamRequest {
        CreateLiveStreamRequest {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_parse_feed_size() {
        assert_eq!(parse_feed_size(None).unwrap(), DEFAULT_FEED_SIZE);
        assert_eq!(parse_feed_size(Some("3")).unwrap(), 3);
        assert_eq!(parse_feed_size(Some("1000")).unwrap(), MAX_FEED_SIZE);
        assert!(parse_feed_size(Some("invalid")).is_err());
        assert!(parse_feed_size(Some("0")).is_err());
    }

    #[tokio::test]
    async fn test_create_returns_key_to_owner_only() {
        let (service, bob, alice) = setup().await;
        let created = service.create_stream(bob.id, create("Bob live")).await.unwrap();

        let own = service.get_stream(created.stream_id, bob.id).await.unwrap();
        assert_eq!(own.stream_key.as_deref(), Some(created.stream_key.as_str()));

        let other = service.get_stream(created.stream_id, alice.id).await.unwrap();
        assert!(other.stream_key.is_none());
    }

    #[tokio::test]
    async fn test_only_owner_can_modify() {
        let (service, bob, alice) = setup().await;
        let created = service.create_stream(bob.id, create("Bob live")).await.unwrap();

        let params = UpdateLiveStreamParams {
            status: Some("true".into()),
            name: None,
        };
        assert!(matches!(
            service.update_stream(created.stream_id, alice.id, params).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete_stream(created.stream_id, alice.id).await,
            Err(AppError::Forbidden(_))
        ));

        let params = UpdateLiveStreamParams {
            status: Some("true".into()),
            name: Some("Renamed".into()),
        };
        let updated = service
            .update_stream(created.stream_id, bob.id, params)
            .await
            .unwrap();
        assert!(updated.is_live);
        assert_eq!(updated.name, "Renamed");

        service.delete_stream(created.stream_id, bob.id).await.unwrap();
        assert!(matches!(
            service.get_stream(created.stream_id, bob.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_validation() {
        let (service, bob, _) = setup().await;
        let created = service.create_stream(bob.id, create("Bob live")).await.unwrap();

        assert!(matches!(
            service
                .update_stream(created.stream_id, bob.id, UpdateLiveStreamParams::default())
                .await,
            Err(AppError::Validation(_))
        ));

        let params = UpdateLiveStreamParams {
            status: Some("maybe".into()),
            name: None,
        };
        assert!(matches!(
            service.update_stream(created.stream_id, bob.id, params).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_overlong_names_rejected() {
        let (service, bob, _) = setup().await;
        assert!(matches!(
            service.create_stream(bob.id, create(&"x".repeat(256))).await,
            Err(AppError::Validation(_))
        ));

        let created = service.create_stream(bob.id, create("Bob live")).await.unwrap();
        let params = UpdateLiveStreamParams {
            status: None,
            name: Some("x".repeat(256)),
        };
        assert!(matches!(
            service.update_stream(created.stream_id, bob.id, params).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_feed_hides_keys() {
        let (service, bob, _) = setup().await;
        service.create_stream(bob.id, create("one")).await.unwrap();
        service.create_stream(bob.id, create("two")).await.unwrap();

        let feed = service.feed(Some("1")).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert!(feed.iter().all(|s| s.stream_key.is_none()));
    }
}
