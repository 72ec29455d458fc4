//! Port for one-way password hashing.

use crate::domain::Error;

/// Failures raised by password hashing adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordHashError {
    /// The algorithm could not produce a hash.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
    /// Stored hash could not be parsed.
    #[error("stored password hash is malformed: {message}")]
    MalformedHash { message: String },
}

impl From<PasswordHashError> for Error {
    fn from(error: PasswordHashError) -> Self {
        Error::internal(error.to_string())
    }
}

/// Hash and verify passwords. Implementations choose their own salt.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash string (PHC format).
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// `Ok(false)` when the password does not match.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
