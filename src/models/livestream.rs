use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Random bytes behind a stream key (192 bits).
const STREAM_KEY_BYTES: usize = 24;

/// Database row for the live_streams table
#[derive(Debug, Clone, FromRow)]
pub struct LiveStream {
    pub id: Uuid,
    pub name: String,
    pub stream_key: String,
    pub publisher_id: Uuid,
    pub viewer_count: i32,
    pub is_live: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LiveStream {
    /// New offline stream with a freshly generated key.
    pub fn new(name: String, publisher_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            stream_key: generate_stream_key(),
            publisher_id,
            viewer_count: 0,
            is_live: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Generate an unguessable, URL-safe stream key.
pub fn generate_stream_key() -> String {
    let mut bytes = [0u8; STREAM_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Stream as returned by the API. The key is only present for its publisher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveStreamView {
    pub id: Uuid,
    pub name: String,
    pub publisher_id: Uuid,
    pub viewer_count: i32,
    pub is_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LiveStreamView {
    pub fn for_viewer(stream: LiveStream, viewer_id: Option<Uuid>) -> Self {
        let stream_key = (viewer_id == Some(stream.publisher_id)).then_some(stream.stream_key);
        Self {
            id: stream.id,
            name: stream.name,
            publisher_id: stream.publisher_id,
            viewer_count: stream.viewer_count,
            is_live: stream.is_live,
            stream_key,
            created_at: stream.created_at,
            updated_at: stream.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateLiveStreamRequest {
    #[validate(length(min = 1, max = 255, message = "stream name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLiveStreamResponse {
    pub stream_id: Uuid,
    /// Secret publish key, shown to the publisher only
    pub stream_key: String,
}

/// Query parameters of `PATCH /livestream/update/:id`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLiveStreamParams {
    pub status: Option<String>,
    #[validate(length(max = 255, message = "stream name is too long"))]
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct LiveStreamChanges {
    pub name: Option<String>,
    pub is_live: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_stream_key_shape() {
        let key = generate_stream_key();
        assert_eq!(key.len(), 32);
        assert!(key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_stream_keys_are_unique() {
        let keys: HashSet<String> = (0..1000).map(|_| generate_stream_key()).collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_key_hidden_from_other_viewers() {
        let owner = Uuid::new_v4();
        let stream = LiveStream::new("My stream".to_string(), owner);

        let public = LiveStreamView::for_viewer(stream.clone(), Some(Uuid::new_v4()));
        assert!(public.stream_key.is_none());

        let anonymous = LiveStreamView::for_viewer(stream.clone(), None);
        assert!(anonymous.stream_key.is_none());

        let own = LiveStreamView::for_viewer(stream.clone(), Some(owner));
        assert_eq!(own.stream_key, Some(stream.stream_key));
    }
}
