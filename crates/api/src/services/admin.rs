//! Store and user administration.
//!
//! Route-level role checks read the token; the operations that create
//! accounts or stores additionally re-verify the requester against the
//! identity store, so a demoted admin cannot keep escalating with a stale
//! token.

use storerate_core::{Email, Role, UserId};

use crate::db::{ConflictKind, RepositoryError, Repositories};
use crate::error::{AppError, Result};
use crate::models::{
    NewStore, OwnerSummary, Principal, RatedStore, StoreFilter, StoreListing, User, UserFilter,
};
use crate::services::auth::{AuthError, AuthService, NewAccount, validate_address, validate_name};
use crate::services::ratings::RatingService;

/// Platform-wide counts for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}

/// Unvalidated store details submitted by an admin.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_id: UserId,
}

/// Administration service.
pub struct AdminService<'a> {
    repos: &'a Repositories,
}

impl<'a> AdminService<'a> {
    /// Create a new administration service.
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Count users, stores and ratings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a count fails.
    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let (total_users, total_stores, total_ratings) = tokio::try_join!(
            self.repos.users.count(),
            self.repos.stores.count(),
            self.repos.ratings.count(),
        )?;

        Ok(DashboardStats {
            total_users,
            total_stores,
            total_ratings,
        })
    }

    /// Users matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>> {
        Ok(self.repos.users.list(filter).await?)
    }

    /// Every store owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_store_owners(&self) -> Result<Vec<User>> {
        Ok(self.repos.users.list(&UserFilter::store_owners()).await?)
    }

    /// Stores matching `filter` with owners and live aggregates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn list_stores(&self, filter: &StoreFilter) -> Result<Vec<RatedStore>> {
        RatingService::new(self.repos).list_stores(filter, None).await
    }

    /// Create an account with any role on behalf of an admin.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the requester is no longer an admin,
    /// `AppError::Conflict` if the email is registered, and a 400-class
    /// error if validation fails.
    #[tracing::instrument(skip(self, account), fields(requester = %requester.user_id))]
    pub async fn create_user(&self, requester: &Principal, account: NewAccount) -> Result<User> {
        self.verify_admin(requester).await?;

        AuthService::new(self.repos.users.as_ref())
            .create_account(account)
            .await
            .map_err(|e| match e {
                AuthError::UserAlreadyExists => {
                    AppError::Conflict("User already exists".to_string())
                }
                other => AppError::Auth(other),
            })
    }

    /// Create a store for a store owner and link it to them.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the requester is no longer an admin,
    /// `AppError::NotFound` if `owner_id` is not a store owner, and
    /// `AppError::Conflict` if the owner already has a store or the store
    /// email is taken. Nothing is persisted on error.
    #[tracing::instrument(skip(self, request), fields(requester = %requester.user_id, owner_id = %request.owner_id))]
    pub async fn create_store(
        &self,
        requester: &Principal,
        request: StoreRequest,
    ) -> Result<StoreListing> {
        self.verify_admin(requester).await?;

        let name = validate_name(&request.name)?;
        let address = validate_address(&request.address)?;
        let email = Email::parse(&request.email)
            .map_err(|e| AppError::BadRequest(format!("Invalid store email: {e}")))?;

        let owner = self
            .repos
            .users
            .get_by_id(request.owner_id)
            .await?
            .filter(|u| u.role == Role::StoreOwner)
            .ok_or_else(|| AppError::NotFound("Store owner not found".to_string()))?;

        if owner.store_id.is_some() {
            return Err(AppError::Conflict(
                "Store owner already has a store assigned".to_string(),
            ));
        }

        if self.repos.stores.get_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "Store with this email already exists".to_string(),
            ));
        }

        // The unit of work re-checks both conditions under lock
        let store = self
            .repos
            .stores
            .create_for_owner(&NewStore {
                name,
                email,
                address,
                owner_id: owner.id,
            })
            .await
            .map_err(create_store_error)?;

        tracing::info!(store_id = %store.id, "Store created");

        Ok(StoreListing {
            store,
            owner: Some(OwnerSummary {
                id: owner.id,
                name: owner.name,
                email: owner.email,
                address: owner.address,
            }),
        })
    }

    async fn verify_admin(&self, requester: &Principal) -> Result<()> {
        let current = self.repos.users.get_by_id(requester.user_id).await?;

        match current {
            Some(user) if user.role == Role::Admin => Ok(()),
            _ => {
                tracing::warn!(user_id = %requester.user_id, "Admin re-verification failed");
                Err(AppError::Forbidden("Admin access required".to_string()))
            }
        }
    }
}

/// Client error for a failed create-store unit of work.
fn create_store_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound(_) => AppError::NotFound("Store owner not found".to_string()),
        RepositoryError::Conflict(ConflictKind::OwnerHasStore) => {
            AppError::Conflict("Store owner already has a store assigned".to_string())
        }
        RepositoryError::Conflict(ConflictKind::StoreEmail | ConflictKind::UserEmail) => {
            AppError::Conflict("Store with this email already exists".to_string())
        }
        other => AppError::Database(other),
    }
}
