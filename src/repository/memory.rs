//! In-memory repositories
//!
//! One [`InMemoryStore`] implements all three repository traits over shared
//! state, enforcing the same uniqueness rules as the PostgreSQL schema.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DuplicateUser, FollowRepository, LiveStreamRepository, UserRepository};
use crate::models::{LiveStream, LiveStreamChanges, User, UserChanges};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    streams: HashMap<Uuid, LiveStream>,
    follows: HashMap<(Uuid, Uuid), DateTime<Utc>>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn users_by_edge(&self, user_id: Uuid, followers: bool) -> Vec<User> {
        let mut edges: Vec<(&(Uuid, Uuid), &DateTime<Utc>)> = self
            .follows
            .iter()
            .filter(|((follower, followee), _)| {
                if followers {
                    *followee == user_id
                } else {
                    *follower == user_id
                }
            })
            .collect();
        edges.sort_by(|a, b| b.1.cmp(a.1));

        edges
            .into_iter()
            .filter_map(|((follower, followee), _)| {
                let other = if followers { follower } else { followee };
                self.users.get(other).cloned()
            })
            .collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.id) {
            bail!("duplicate user id {}", user.id);
        }
        if inner.username_taken(&user.username, None) {
            return Err(DuplicateUser { field: "username" }.into());
        }
        if inner.email_taken(&user.email, None) {
            return Err(DuplicateUser { field: "email" }.into());
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;
        if let Some(username) = &changes.username {
            if inner.username_taken(username, Some(id)) {
                return Err(DuplicateUser { field: "username" }.into());
            }
        }
        if let Some(email) = &changes.email {
            if inner.email_taken(email, Some(id)) {
                return Err(DuplicateUser { field: "email" }.into());
            }
        }

        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            user.name = Some(name.clone());
        }
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(hash) = &changes.password_hash {
            user.password_hash = hash.clone();
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }
}

#[async_trait]
impl LiveStreamRepository for InMemoryStore {
    async fn create_live_stream(&self, stream: &LiveStream) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&stream.publisher_id) {
            bail!("publisher {} does not exist", stream.publisher_id);
        }
        if inner
            .streams
            .values()
            .any(|s| s.id == stream.id || s.stream_key == stream.stream_key)
        {
            bail!("duplicate stream id or key");
        }
        inner.streams.insert(stream.id, stream.clone());
        Ok(())
    }

    async fn get_live_stream_by_id(&self, id: Uuid) -> Result<Option<LiveStream>> {
        Ok(self.inner.read().await.streams.get(&id).cloned())
    }

    async fn get_live_stream_by_key(&self, stream_key: &str) -> Result<Option<LiveStream>> {
        let inner = self.inner.read().await;
        Ok(inner
            .streams
            .values()
            .find(|s| s.stream_key == stream_key)
            .cloned())
    }

    async fn list_by_publisher(&self, publisher_id: Uuid) -> Result<Vec<LiveStream>> {
        let inner = self.inner.read().await;
        let mut streams: Vec<LiveStream> = inner
            .streams
            .values()
            .filter(|s| s.publisher_id == publisher_id)
            .cloned()
            .collect();
        streams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(streams)
    }

    async fn list_feed(&self, limit: i64) -> Result<Vec<LiveStream>> {
        let inner = self.inner.read().await;
        let mut streams: Vec<LiveStream> = inner.streams.values().cloned().collect();
        streams.sort_by(|a, b| {
            b.is_live
                .cmp(&a.is_live)
                .then(b.viewer_count.cmp(&a.viewer_count))
                .then(b.created_at.cmp(&a.created_at))
        });
        streams.truncate(limit.max(0) as usize);
        Ok(streams)
    }

    async fn update_live_stream(
        &self,
        id: Uuid,
        changes: &LiveStreamChanges,
    ) -> Result<Option<LiveStream>> {
        let mut inner = self.inner.write().await;
        let Some(stream) = inner.streams.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            stream.name = name.clone();
        }
        if let Some(is_live) = changes.is_live {
            stream.is_live = is_live;
        }
        stream.updated_at = Utc::now();
        Ok(Some(stream.clone()))
    }

    async fn delete_live_stream(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().await.streams.remove(&id).is_some())
    }

    async fn delete_by_publisher(&self, publisher_id: Uuid) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.streams.len();
        inner.streams.retain(|_, s| s.publisher_id != publisher_id);
        Ok((before - inner.streams.len()) as u64)
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if follower_id == followee_id {
            bail!("a user cannot follow themselves");
        }
        if !inner.users.contains_key(&follower_id) || !inner.users.contains_key(&followee_id) {
            bail!("follow edge references a missing user");
        }
        if inner.follows.contains_key(&(follower_id, followee_id)) {
            return Ok(false);
        }
        inner.follows.insert((follower_id, followee_id), Utc::now());
        Ok(true)
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.follows.remove(&(follower_id, followee_id)).is_some())
    }

    async fn list_followers(&self, user_id: Uuid) -> Result<Vec<User>> {
        Ok(self.inner.read().await.users_by_edge(user_id, true))
    }

    async fn list_following(&self, user_id: Uuid) -> Result<Vec<User>> {
        Ok(self.inner.read().await.users_by_edge(user_id, false))
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.follows.len();
        inner
            .follows
            .retain(|(follower, followee), _| *follower != user_id && *followee != user_id);
        Ok((before - inner.follows.len()) as u64)
    }
}
