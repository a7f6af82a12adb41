/// Security module: credential hashing and session tokens
pub mod jwt;
pub mod password;

pub use jwt::{SessionClaims, TokenCodec, TokenError};
pub use password::{hash_password, verify_password, PasswordError};
