//! Rating submission and aggregation.
//!
//! Aggregates are always computed from the rating ledger at read time; the
//! cached columns on `stores` are never consulted.

use storerate_core::{RatingSummary, RatingValue, Role, StoreId, UserId};

use crate::db::{RepositoryError, Repositories};
use crate::error::{AppError, Result};
use crate::models::{
    OwnerRatings, Principal, RatedStore, Rating, StoreFilter, StoreListing, SubmittedRating,
};

/// Rating service.
///
/// Borrowed per request from the shared repositories.
pub struct RatingService<'a> {
    repos: &'a Repositories,
}

impl<'a> RatingService<'a> {
    /// Create a new rating service.
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Record the caller's rating of a store, replacing any previous one.
    ///
    /// Resubmitting the same value is a no-op for the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if `value` is outside 1-5,
    /// `AppError::NotFound` if the store doesn't exist, and
    /// `AppError::Forbidden` if the caller owns the store.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id))]
    pub async fn submit_rating(
        &self,
        principal: &Principal,
        store_id: StoreId,
        value: i64,
    ) -> Result<SubmittedRating> {
        let value = RatingValue::new(value).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let store = self
            .repos
            .stores
            .get_by_id(store_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        if store.owner_id == principal.user_id {
            return Err(AppError::Forbidden(
                "You cannot rate your own store".to_string(),
            ));
        }

        let rating = self
            .repos
            .ratings
            .upsert(store_id, principal.user_id, value)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => AppError::NotFound("Store not found".to_string()),
                other => AppError::Database(other),
            })?;

        let summary = self.repos.ratings.summary(store_id).await?;

        tracing::info!(
            store_id = %store_id,
            rating = %rating.value,
            average = summary.average,
            count = summary.count,
            "Rating recorded"
        );

        Ok(SubmittedRating {
            summary,
            user_rating: rating.value,
        })
    }

    /// Mean and count of a store's current ratings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the ledger can't be read.
    pub async fn get_aggregate(&self, store_id: StoreId) -> Result<RatingSummary> {
        Ok(self.repos.ratings.summary(store_id).await?)
    }

    /// The caller's own rating of a store, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the ledger can't be read.
    pub async fn get_user_rating(
        &self,
        principal: &Principal,
        store_id: StoreId,
    ) -> Result<Option<Rating>> {
        Ok(self.repos.ratings.get(store_id, principal.user_id).await?)
    }

    /// Every rating of the caller's store with rater details and the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the caller is not `owner_id` or the
    /// user is not a store owner, and `AppError::NotFound` if the owner
    /// doesn't exist or has no store.
    pub async fn list_ratings_for_owner(
        &self,
        principal: &Principal,
        owner_id: UserId,
    ) -> Result<OwnerRatings> {
        if principal.user_id != owner_id {
            return Err(AppError::Forbidden(
                "You can only view ratings for your own store".to_string(),
            ));
        }

        let owner = self
            .repos
            .users
            .get_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Owner not found".to_string()))?;

        if owner.role != Role::StoreOwner {
            return Err(AppError::Forbidden(
                "Specified user is not a store owner".to_string(),
            ));
        }

        let store_id = owner
            .store_id
            .ok_or_else(|| AppError::NotFound("No store associated with this owner".to_string()))?;

        let ratings = self.repos.ratings.list_for_store(store_id).await?;
        let summary = self.repos.ratings.summary(store_id).await?;

        Ok(OwnerRatings {
            store_id,
            ratings,
            summary,
        })
    }

    /// Stores matching `filter`, newest first, each with its live aggregate
    /// and the viewer's own rating when a viewer is given.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a repository call fails.
    pub async fn list_stores(
        &self,
        filter: &StoreFilter,
        viewer: Option<&Principal>,
    ) -> Result<Vec<RatedStore>> {
        let listings = self.repos.stores.list(filter).await?;
        self.annotate(listings, viewer).await
    }

    async fn annotate(
        &self,
        listings: Vec<StoreListing>,
        viewer: Option<&Principal>,
    ) -> Result<Vec<RatedStore>> {
        let ids: Vec<StoreId> = listings.iter().map(|l| l.store.id).collect();

        let summaries = self.repos.ratings.summaries(&ids).await?;
        let own = match viewer {
            Some(principal) => {
                self.repos
                    .ratings
                    .values_by_user(principal.user_id, &ids)
                    .await?
            }
            None => std::collections::HashMap::new(),
        };

        Ok(listings
            .into_iter()
            .map(|listing| {
                let id = listing.store.id;
                RatedStore {
                    summary: summaries.get(&id).copied().unwrap_or(RatingSummary::EMPTY),
                    user_rating: own.get(&id).copied(),
                    listing,
                }
            })
            .collect())
    }
}
