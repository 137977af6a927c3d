//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during account and credential operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] storerate_core::EmailError),

    /// Name or address failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The current password supplied for a password change is wrong.
    #[error("current password is incorrect")]
    IncorrectPassword,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password does not satisfy the password rule.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Public registration cannot create administrators.
    #[error("admin accounts cannot be self-registered")]
    AdminRegistrationForbidden,

    /// The caller tried to act on another user's account.
    #[error("cannot modify another user's account")]
    NotAccountOwner,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
