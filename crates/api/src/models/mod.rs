//! Domain models for the API.
//!
//! These are validated domain objects, separate from database row types and
//! from the JSON views returned by route handlers.

pub mod rating;
pub mod store;
pub mod user;

use serde::{Deserialize, Serialize};
use storerate_core::{Role, UserId};

pub use rating::{OwnerRatings, Rating, RaterRating, SubmittedRating};
pub use store::{NewStore, OwnerSummary, RatedStore, Store, StoreFilter, StoreListing};
pub use user::{NewUser, User, UserFilter};

/// The authenticated caller, decoded from a verified bearer token.
///
/// Passed explicitly into every service operation that needs to know who is
/// calling. The role is the one embedded in the token at issuance time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Authenticated user.
    pub user_id: UserId,
    /// Role embedded in the token.
    pub role: Role,
}

impl Principal {
    /// Whether the token-derived role equals `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
