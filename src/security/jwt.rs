//! Session token issuance and verification
//!
//! Tokens are HS256 JWTs carrying a fixed claim set. The signing secret is
//! handed to [`TokenCodec`] once at startup and never re-read, so tokens signed
//! before a secret rotation stop verifying afterwards. There is no server-side
//! token store and therefore no revocation before expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret unavailable")]
    SigningUnavailable,

    #[error("malformed token")]
    MalformedToken,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

/// Session token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: Uuid,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    has_secret: bool,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            has_secret: !secret.is_empty(),
        }
    }

    /// Issue a token for `user_id` that expires `ttl` from now.
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = SessionClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    /// Sign an explicit claim set.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        if !self.has_secret {
            return Err(TokenError::SigningUnavailable);
        }

        encode(&Header::new(JWT_ALGORITHM), claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign session token");
            TokenError::SigningUnavailable
        })
    }

    /// Verify a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify against an explicit clock instant.
    ///
    /// The signature is checked before the expiry, so a token from a foreign
    /// secret reports `BadSignature` even when it is also past its `exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        // Expiry is checked below with no leeway: a token is dead at exactly `exp`.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::MalformedToken,
            },
        )?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.sub)
    }
}
