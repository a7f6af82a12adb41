//! Persistence traits for users, streams and follows
//!
//! Handlers and services only see these traits. `Pg*Repository` types back
//! them with PostgreSQL; [`memory::InMemoryStore`] backs all three with
//! process memory for tests and local runs.
//!
//! Absence is `Ok(None)` / `Ok(false)`, never an error. Errors are reserved
//! for storage faults.

mod follows;
mod livestreams;
pub mod memory;
mod users;

pub use follows::PgFollowRepository;
pub use livestreams::PgLiveStreamRepository;
pub use users::PgUserRepository;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{LiveStream, LiveStreamChanges, User, UserChanges};

/// A user write collided with an existing username or email.
///
/// Travels inside the repository's `anyhow::Error`; the HTTP layer downcasts
/// it into a 400 instead of a storage fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a user with this {field} already exists")]
pub struct DuplicateUser {
    pub field: &'static str,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`DuplicateUser`] when the username or email is taken.
    async fn create_user(&self, user: &User) -> Result<()>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    /// Apply the non-empty fields of `changes`. Returns the updated row, or
    /// `None` if the user does not exist. Fails with [`DuplicateUser`] when
    /// the new username or email belongs to someone else.
    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> Result<Option<User>>;

    async fn delete_user(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait LiveStreamRepository: Send + Sync {
    async fn create_live_stream(&self, stream: &LiveStream) -> Result<()>;

    async fn get_live_stream_by_id(&self, id: Uuid) -> Result<Option<LiveStream>>;

    /// Stream keys are unique, so this matches at most one stream.
    async fn get_live_stream_by_key(&self, stream_key: &str) -> Result<Option<LiveStream>>;

    async fn list_by_publisher(&self, publisher_id: Uuid) -> Result<Vec<LiveStream>>;

    /// Live streams first, then by viewer count, then newest.
    async fn list_feed(&self, limit: i64) -> Result<Vec<LiveStream>>;

    async fn update_live_stream(
        &self,
        id: Uuid,
        changes: &LiveStreamChanges,
    ) -> Result<Option<LiveStream>>;

    async fn delete_live_stream(&self, id: Uuid) -> Result<bool>;

    /// Returns the number of streams removed.
    async fn delete_by_publisher(&self, publisher_id: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Returns `true` if the edge was created, `false` if it already existed.
    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    async fn list_followers(&self, user_id: Uuid) -> Result<Vec<User>>;

    async fn list_following(&self, user_id: Uuid) -> Result<Vec<User>>;

    /// Remove every edge in which `user_id` takes part.
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64>;
}
