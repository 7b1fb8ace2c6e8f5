//! Passwords, session tokens and the extractors that resolve the requesting user.

mod extract;
mod password;
mod token;

use thiserror::Error;

pub use extract::{CurrentUser, MaybeUser, PageUser, SESSION_COOKIE};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenManager};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token encoding failed: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}
