//! Admin account management commands.
//!
//! Public registration refuses the admin role, so the first admin has to be
//! created here.
//!
//! # Usage
//!
//! ```bash
//! STORERATE_ADMIN_PASSWORD='Str0ng!Pass' \
//!     storerate-cli admin create -e admin@example.com -n "Admin Name"
//! ```
//!
//! # Environment Variables
//!
//! - `STORERATE_DATABASE_URL` - `PostgreSQL` connection string
//! - `STORERATE_ADMIN_PASSWORD` - Password for the new account

use storerate_api::db::{self, Repositories};
use storerate_api::services::auth::{AuthError, AuthService, NewAccount};
use storerate_core::{Role, UserId};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// Validation or persistence failure.
    #[error(transparent)]
    Auth(AuthError),
}

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `AdminError` if the database is unreachable, the email is taken
/// or any field fails validation.
pub async fn create_user(
    email: &str,
    name: &str,
    address: &str,
    password: String,
) -> Result<UserId, AdminError> {
    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("STORERATE_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let repos = Repositories::postgres(&pool);

    tracing::info!("Creating admin user: {}", email);

    let user = AuthService::new(repos.users.as_ref())
        .create_account(NewAccount {
            name: name.to_owned(),
            email: email.to_owned(),
            password,
            address: address.to_owned(),
            role: Role::Admin,
        })
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AdminError::UserExists(email.to_owned()),
            other => AdminError::Auth(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}
