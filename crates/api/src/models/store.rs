//! Store domain types.

use chrono::{DateTime, Utc};

use storerate_core::{Email, RatingSummary, RatingValue, StoreId, UserId};

use super::user::contains_ci;

/// A registered store (domain type).
///
/// The `rating`/`rating_count` cache columns are not part of the domain
/// type; aggregates always come from the rating ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name (trimmed).
    pub name: String,
    /// Normalized contact email, unique across stores.
    pub email: Email,
    /// Postal address (trimmed).
    pub address: String,
    /// Owning store owner, set once at creation.
    pub owner_id: UserId,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a store.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub owner_id: UserId,
}

/// Public details of a store's owner, attached to listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub address: String,
}

/// A store joined with its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreListing {
    pub store: Store,
    /// `None` only if the owner record has gone missing.
    pub owner: Option<OwnerSummary>,
}

/// A store listing with its live aggregate and, for signed-in viewers,
/// the viewer's own rating.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedStore {
    pub listing: StoreListing,
    pub summary: RatingSummary,
    pub user_rating: Option<RatingValue>,
}

/// Optional filters for listing stores.
///
/// `name`, `email` and `address` must all match when set. `search` matches
/// when either the name or the address contains it. All matching is
/// case-insensitive substring matching.
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub search: Option<String>,
}

impl StoreFilter {
    /// Filter used by the public store browser.
    #[must_use]
    pub fn search(term: Option<String>) -> Self {
        Self {
            search: term,
            ..Self::default()
        }
    }

    /// Whether `store` passes every set filter.
    #[must_use]
    pub fn matches(&self, store: &Store) -> bool {
        let search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                contains_ci(Some(term), &store.name) || contains_ci(Some(term), &store.address)
            }
        };

        search
            && contains_ci(self.name.as_deref(), &store.name)
            && contains_ci(self.email.as_deref(), store.email.as_str())
            && contains_ci(self.address.as_deref(), &store.address)
    }
}
