//! Data access for the identity store, store registry and rating ledger.
//!
//! # Contracts
//!
//! Each persisted collection is reached through an async trait so services
//! never depend on a concrete storage engine:
//!
//! - [`UserRepository`] - users, credentials, store-ownership link
//! - [`StoreRepository`] - stores and the create-store/stamp-owner unit of work
//! - [`RatingRepository`] - the rating ledger, keyed on `(store, user)`
//!
//! Two implementations exist: `PostgreSQL` (`users`, `stores`, `ratings`
//! modules) and an in-memory store ([`memory`]) for tests and local runs.
//!
//! # Units of work
//!
//! [`StoreRepository::create_for_owner`] and [`RatingRepository::upsert`] are
//! all-or-nothing: either every write they perform is visible or none is.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p storerate-cli -- migrate
//! ```

pub mod memory;
pub mod ratings;
pub mod stores;
pub mod users;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use storerate_core::{Email, RatingSummary, RatingValue, StoreId, UserId};

use crate::models::{
    NewStore, NewUser, Rating, RaterRating, Store, StoreFilter, StoreListing, User, UserFilter,
};

pub use memory::MemoryDatastore;
pub use ratings::PgRatingRepository;
pub use stores::PgStoreRepository;
pub use users::PgUserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested or referenced entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Constraint violation (e.g., unique email, owner already has a store).
    #[error("constraint violation: {0}")]
    Conflict(ConflictKind),
}

/// The uniqueness rule a write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Another user already has this email.
    UserEmail,
    /// Another store already has this email.
    StoreEmail,
    /// The owner is already linked to a store.
    OwnerHasStore,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UserEmail => "email already exists",
            Self::StoreEmail => "store with this email already exists",
            Self::OwnerHasStore => "owner already has a store assigned",
        })
    }
}

/// Users, credentials and the store-ownership link.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user by ID.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a user by (normalized) email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Get a user together with their password hash, by email.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Get a user's password hash by ID.
    async fn get_password_hash_by_id(&self, id: UserId)
    -> Result<Option<String>, RepositoryError>;

    /// Insert a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError>;

    /// Replace a user's password hash.
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;

    /// List users matching `filter`, newest first.
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError>;

    /// Total number of users.
    async fn count(&self) -> Result<i64, RepositoryError>;
}

/// Stores and their owners.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Get a store by ID.
    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    /// Get a store by (normalized) email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<Store>, RepositoryError>;

    /// Insert a store and stamp it onto its owner as one unit of work.
    ///
    /// Returns `RepositoryError::NotFound` if the owner does not exist or is not
    /// a store owner, and `RepositoryError::Conflict` if the owner already has a
    /// store or the email is taken. Nothing is persisted on error.
    async fn create_for_owner(&self, new_store: &NewStore) -> Result<Store, RepositoryError>;

    /// List stores matching `filter` with their owners, newest first.
    async fn list(&self, filter: &StoreFilter) -> Result<Vec<StoreListing>, RepositoryError>;

    /// Total number of stores.
    async fn count(&self) -> Result<i64, RepositoryError>;
}

/// The rating ledger. The only source of truth for aggregates.
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Atomically insert or overwrite the rating for `(store_id, user_id)`.
    ///
    /// Concurrent calls for the same key resolve last-write-wins and never
    /// create a second record. Returns `RepositoryError::NotFound` if the store
    /// does not exist.
    async fn upsert(
        &self,
        store_id: StoreId,
        user_id: UserId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError>;

    /// Get one user's rating of one store.
    async fn get(
        &self,
        store_id: StoreId,
        user_id: UserId,
    ) -> Result<Option<Rating>, RepositoryError>;

    /// Aggregate a store's ratings from a full ledger scan.
    async fn summary(&self, store_id: StoreId) -> Result<RatingSummary, RepositoryError>;

    /// Aggregate several stores at once. Stores without ratings are absent.
    async fn summaries(
        &self,
        store_ids: &[StoreId],
    ) -> Result<HashMap<StoreId, RatingSummary>, RepositoryError>;

    /// The values one user gave to the listed stores. Unrated stores are absent.
    async fn values_by_user(
        &self,
        user_id: UserId,
        store_ids: &[StoreId],
    ) -> Result<HashMap<StoreId, RatingValue>, RepositoryError>;

    /// Every rating of a store with rater details, newest first.
    async fn list_for_store(&self, store_id: StoreId)
    -> Result<Vec<RaterRating>, RepositoryError>;

    /// Total number of ratings.
    async fn count(&self) -> Result<i64, RepositoryError>;
}

/// The three repositories, shared across handlers.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub stores: Arc<dyn StoreRepository>,
    pub ratings: Arc<dyn RatingRepository>,
}

impl Repositories {
    /// Repositories backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            stores: Arc::new(PgStoreRepository::new(pool.clone())),
            ratings: Arc::new(PgRatingRepository::new(pool.clone())),
        }
    }

    /// Repositories backed by a fresh in-memory datastore.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_memory(&MemoryDatastore::new())
    }

    /// Repositories sharing an existing in-memory datastore.
    #[must_use]
    pub fn from_memory(datastore: &MemoryDatastore) -> Self {
        Self {
            users: Arc::new(datastore.clone()),
            stores: Arc::new(datastore.clone()),
            ratings: Arc::new(datastore.clone()),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Build an `ILIKE` pattern for a case-insensitive substring match.
///
/// Returns `None` for unset or blank terms so the filter is skipped.
pub(crate) fn like_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;

    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

/// Map a sqlx error, turning unique violations into `Conflict`.
///
/// `describe` receives the violated constraint name (if any) and returns the
/// conflict kind.
pub(crate) fn map_unique_violation(
    err: sqlx::Error,
    describe: impl FnOnce(Option<&str>) -> ConflictKind,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(describe(db_err.constraint()));
    }
    RepositoryError::Database(err)
}
