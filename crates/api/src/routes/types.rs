//! JSON views shared by the route handlers.
//!
//! Field names are camelCase on the wire. Password hashes never appear in
//! any view.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storerate_core::{Email, RatingValue, Role, StoreId, UserId};

use crate::error::{AppError, Result};
use crate::models::{OwnerSummary, RatedStore, StoreListing, User};

/// Public view of a user account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub address: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<StoreId>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            address: user.address,
            role: user.role,
            store_id: user.store_id,
            created_at: user.created_at,
        }
    }
}

/// Owner details attached to a store.
#[derive(Debug, Serialize)]
pub struct OwnerView {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub address: String,
}

impl From<OwnerSummary> for OwnerView {
    fn from(owner: OwnerSummary) -> Self {
        Self {
            id: owner.id,
            name: owner.name,
            email: owner.email,
            address: owner.address,
        }
    }
}

/// A store with its owner and live aggregate.
///
/// `userRating` is `null` for anonymous viewers and for viewers who have not
/// rated the store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreView {
    pub id: StoreId,
    pub name: String,
    pub email: Email,
    pub address: String,
    pub owner: Option<OwnerView>,
    pub rating: f64,
    pub rating_count: i64,
    pub user_rating: Option<RatingValue>,
    pub created_at: DateTime<Utc>,
}

impl From<RatedStore> for StoreView {
    fn from(rated: RatedStore) -> Self {
        let StoreListing { store, owner } = rated.listing;

        Self {
            id: store.id,
            name: store.name,
            email: store.email,
            address: store.address,
            owner: owner.map(OwnerView::from),
            rating: rated.summary.average,
            rating_count: rated.summary.count,
            user_rating: rated.user_rating,
            created_at: store.created_at,
        }
    }
}

/// An identifier as clients send it, either a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Number(i64),
    Text(String),
}

impl IdInput {
    /// Parse into a typed ID, failing with `message` as a 400.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the value is not a valid ID.
    pub fn parse<T: FromStr>(&self, message: &str) -> Result<T> {
        match self {
            Self::Number(n) => parse_id(&n.to_string(), message),
            Self::Text(s) => parse_id(s, message),
        }
    }
}

/// Parse a path or query segment into a typed ID, failing with `message`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if `raw` is not a valid ID.
pub fn parse_id<T: FromStr>(raw: &str, message: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(message.to_string()))
}
