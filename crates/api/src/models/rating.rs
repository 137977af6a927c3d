//! Rating ledger domain types.

use chrono::{DateTime, Utc};

use storerate_core::{Email, RatingId, RatingSummary, RatingValue, StoreId, UserId};

/// One user's rating of one store.
///
/// At most one exists per `(store_id, user_id)`; resubmissions overwrite
/// `value` in place and keep `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating {
    pub id: RatingId,
    pub store_id: StoreId,
    pub user_id: UserId,
    pub value: RatingValue,
    pub created_at: DateTime<Utc>,
}

/// A rating joined with the rater's public details (owner-facing view).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaterRating {
    pub id: RatingId,
    /// `None` when the rater record no longer exists.
    pub rater_name: Option<String>,
    pub rater_email: Option<Email>,
    pub value: RatingValue,
    pub created_at: DateTime<Utc>,
}

/// Result of a rating submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmittedRating {
    /// Aggregate recomputed from the ledger after the write.
    pub summary: RatingSummary,
    /// The value the caller now has on record.
    pub user_rating: RatingValue,
}

/// Every rating of an owner's store, newest first, with the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerRatings {
    pub store_id: StoreId,
    pub ratings: Vec<RaterRating>,
    pub summary: RatingSummary,
}
