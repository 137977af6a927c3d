//! Authentication service.
//!
//! Account creation, password login and password changes. Raw passwords
//! only ever exist in request memory; they are hashed with Argon2id before
//! persistence and never logged.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use storerate_core::{Email, Role, UserId};

use crate::db::{RepositoryError, UserRepository};
use crate::models::{NewUser, Principal, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 16;
/// Characters that satisfy the special-character requirement.
const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*";
/// Maximum length of a user or store name.
pub const MAX_NAME_LENGTH: usize = 60;
/// Maximum length of a postal address.
pub const MAX_ADDRESS_LENGTH: usize = 400;

/// Unvalidated account details, as submitted by a client or an admin.
#[derive(Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: Role,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("address", &self.address)
            .field("role", &self.role)
            .finish()
    }
}

/// Authentication service.
///
/// Borrowed per request from the shared repositories.
pub struct AuthService<'a> {
    users: &'a dyn UserRepository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserRepository) -> Self {
        Self { users }
    }

    /// Register a new account through the public sign-up flow.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AdminRegistrationForbidden` if `role` is admin,
    /// plus every error of [`Self::create_account`].
    pub async fn register(&self, account: NewAccount) -> Result<User, AuthError> {
        if !account.role.is_self_assignable() {
            return Err(AuthError::AdminRegistrationForbidden);
        }
        self.create_account(account).await
    }

    /// Validate, hash and persist a new account with any role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::InvalidInput` or
    /// `AuthError::WeakPassword` on validation failure, and
    /// `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn create_account(&self, account: NewAccount) -> Result<User, AuthError> {
        let name = validate_name(&account.name)?;
        let email = Email::parse(&account.email)?;
        let address = validate_address(&account.address)?;
        validate_password(&account.password)?;

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(&account.password)?;

        // The unique index still decides races between concurrent sign-ups
        let user = self
            .users
            .create(&NewUser {
                name,
                email,
                password_hash,
                address,
                role: account.role,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account created");

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Replace the caller's password after checking the current one.
    ///
    /// Existing tokens stay valid; none is reissued.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has id `target`,
    /// `AuthError::NotAccountOwner` if `target` is not the caller,
    /// `AuthError::IncorrectPassword` if `current_password` does not match,
    /// and `AuthError::WeakPassword` if the new password is rejected.
    pub async fn update_password(
        &self,
        principal: &Principal,
        target: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let password_hash = self
            .users
            .get_password_hash_by_id(target)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if principal.user_id != target {
            return Err(AuthError::NotAccountOwner);
        }

        verify_password(current_password, &password_hash)
            .map_err(|_| AuthError::IncorrectPassword)?;

        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;

        self.users
            .update_password_hash(target, &new_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %target, "Password updated");

        Ok(())
    }
}

// =============================================================================
// Validation and hashing
// =============================================================================

/// Validate a password against the password rule.
///
/// 8 to 16 characters, at least one uppercase letter and at least one of
/// `!@#$%^&*`.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` describing the first failed requirement.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(AuthError::WeakPassword(format!(
            "Password must be {MIN_PASSWORD_LENGTH}-{MAX_PASSWORD_LENGTH} characters"
        )));
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(AuthError::WeakPassword(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(AuthError::WeakPassword(format!(
            "Password must contain at least one special character ({PASSWORD_SPECIAL_CHARS})"
        )));
    }

    Ok(())
}

/// Trim and validate a user or store name.
///
/// # Errors
///
/// Returns `AuthError::InvalidInput` if the name is blank or too long.
pub fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidInput("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

/// Trim and validate a postal address.
///
/// # Errors
///
/// Returns `AuthError::InvalidInput` if the address is too long.
pub fn validate_address(address: &str) -> Result<String, AuthError> {
    let address = address.trim();
    if address.chars().count() > MAX_ADDRESS_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Address must be at most {MAX_ADDRESS_LENGTH} characters"
        )));
    }
    Ok(address.to_string())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
