//! Authentication primitives: password hashing and signed tokens.
//!
//! Request-level enforcement lives in `http::extractors::CurrentUser`.

pub mod password;
pub mod tokens;

pub use password::{hash_password, verify_password};
pub use tokens::{Claims, IssuedTokens, TokenService, TokenType};

/// Authentication failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("user is inactive")]
    Inactive,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}
