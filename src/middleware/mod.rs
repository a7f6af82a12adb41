mod auth;

pub use auth::{extract_bearer, require_auth, CurrentUser, MALFORMED_CREDENTIAL, MISSING_CREDENTIAL};
