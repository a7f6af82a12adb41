//! Publish authorization handshake
//!
//! Decides whether a media server may accept an incoming publish connection.
//! The caller has already extracted the stream key, username and password
//! from whatever envelope the media server uses.
//!
//! Checks run in a fixed order and stop at the first failure:
//! credentials present, username known, password correct, stream key known,
//! stream owned by the publisher. The user and stream lookups are issued
//! together, but the stream result is only looked at once the password has
//! been verified, so the decision never reveals key validity to a caller
//! with bad credentials.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::{LiveStreamRepository, UserRepository};
use crate::security::password::verify_password_blocking;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    MissingCredentials,
    InvalidUsername,
    IncorrectPassword,
    InvalidStreamKey,
}

impl DenialReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing username/password combination",
            Self::InvalidUsername => "invalid username",
            Self::IncorrectPassword => "incorrect password",
            Self::InvalidStreamKey => "invalid stream key",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishDecision {
    Granted { stream_id: Uuid, location: String },
    Denied(DenialReason),
}

impl PublishDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

pub struct PublishAuthorizer {
    users: Arc<dyn UserRepository>,
    streams: Arc<dyn LiveStreamRepository>,
    ingest_base_url: String,
    enforce_ownership: bool,
}

impl PublishAuthorizer {
    pub fn new(
        users: Arc<dyn UserRepository>,
        streams: Arc<dyn LiveStreamRepository>,
        ingest_base_url: String,
        enforce_ownership: bool,
    ) -> Self {
        Self {
            users,
            streams,
            ingest_base_url,
            enforce_ownership,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.users.clone(),
            state.streams.clone(),
            state.config.publish.ingest_base_url.clone(),
            state.config.publish.enforce_ownership,
        )
    }

    /// Internal media address a granted publisher is redirected to.
    pub fn routing_target(&self, stream_id: Uuid) -> String {
        format!("{}/{}", self.ingest_base_url.trim_end_matches('/'), stream_id)
    }

    /// Run the handshake. Read-only; `Err` means a storage or hashing fault,
    /// never a denial.
    pub async fn authorize(
        &self,
        stream_key: &str,
        username: &str,
        password: &str,
    ) -> anyhow::Result<PublishDecision> {
        if username.is_empty() || password.is_empty() {
            return Ok(self.deny(username, DenialReason::MissingCredentials));
        }

        let (user, stream) = tokio::join!(
            self.users.get_user_by_username(username),
            self.streams.get_live_stream_by_key(stream_key),
        );

        let Some(user) = user? else {
            return Ok(self.deny(username, DenialReason::InvalidUsername));
        };

        let matches =
            verify_password_blocking(password.to_owned(), user.password_hash.clone()).await?;
        if !matches {
            return Ok(self.deny(username, DenialReason::IncorrectPassword));
        }

        let Some(stream) = stream? else {
            return Ok(self.deny(username, DenialReason::InvalidStreamKey));
        };

        if self.enforce_ownership && stream.publisher_id != user.id {
            tracing::warn!(
                username = %username,
                stream_id = %stream.id,
                "publish attempted on a stream owned by another user"
            );
            return Ok(self.deny(username, DenialReason::InvalidStreamKey));
        }

        let location = self.routing_target(stream.id);
        tracing::info!(username = %username, stream_id = %stream.id, "publish authorized");

        Ok(PublishDecision::Granted {
            stream_id: stream.id,
            location,
        })
    }

    fn deny(&self, username: &str, reason: DenialReason) -> PublishDecision {
        tracing::info!(username = %username, reason = %reason, "publish denied");
        PublishDecision::Denied(reason)
    }
}
