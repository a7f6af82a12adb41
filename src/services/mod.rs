mod auth_service;
pub mod publish_auth;
mod stream_service;
mod user_service;

pub use auth_service::AuthService;
pub use publish_auth::{DenialReason, PublishAuthorizer, PublishDecision};
pub use stream_service::StreamService;
pub use user_service::UserService;
