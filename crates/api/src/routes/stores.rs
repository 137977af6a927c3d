//! Store browsing and rating routes.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storerate_core::{Email, RatingId, RatingValue, StoreId, UserId};

use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{RaterRating, StoreFilter};
use crate::routes::types::{IdInput, StoreView, parse_id};
use crate::routes::{ApiJson, ApiQuery};
use crate::services::ratings::RatingService;
use crate::state::AppState;

/// Query string of the store browser.
#[derive(Debug, Deserialize)]
pub struct StoreSearchQuery {
    pub search: Option<String>,
}

/// Rating submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub store_id: IdInput,
    pub rating: i64,
}

/// Aggregate after a submission, with the caller's value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub rating: f64,
    pub rating_count: i64,
    pub user_rating: RatingValue,
}

/// Query string of the rating check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckQuery {
    pub store_id: Option<String>,
}

/// The caller's rating of a store, `null` when absent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub rating: Option<RatingValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One rating in the owner view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRatingView {
    pub id: RatingId,
    pub user_name: String,
    pub user_email: Option<Email>,
    pub rating: RatingValue,
    pub created_at: DateTime<Utc>,
}

impl From<RaterRating> for OwnerRatingView {
    fn from(rating: RaterRating) -> Self {
        Self {
            id: rating.id,
            user_name: rating
                .rater_name
                .unwrap_or_else(|| "Anonymous".to_string()),
            user_email: rating.rater_email,
            rating: rating.value,
            created_at: rating.created_at,
        }
    }
}

/// Every rating of the owner's store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRatingsResponse {
    pub success: bool,
    pub ratings: Vec<OwnerRatingView>,
    pub average_rating: f64,
    pub total_ratings: i64,
}

/// List stores, optionally searching name or address.
///
/// GET /api/stores
///
/// Signed-in callers also get their own rating on each store.
#[tracing::instrument(skip(state, viewer, query))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    ApiQuery(query): ApiQuery<StoreSearchQuery>,
) -> Result<Json<Vec<StoreView>>> {
    let filter = StoreFilter::search(query.search);

    let stores = RatingService::new(state.repos())
        .list_stores(&filter, viewer.as_ref())
        .await?;

    Ok(Json(stores.into_iter().map(StoreView::from).collect()))
}

/// Submit or replace the caller's rating of a store.
///
/// POST /api/stores/ratings
#[tracing::instrument(skip(state, principal, req), fields(user_id = %principal.user_id))]
pub async fn submit_rating(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(req): ApiJson<RatingRequest>,
) -> Result<Json<RatingResponse>> {
    let store_id: StoreId = req.store_id.parse("Invalid store ID")?;

    let submitted = RatingService::new(state.repos())
        .submit_rating(&principal, store_id, req.rating)
        .await?;

    Ok(Json(RatingResponse {
        rating: submitted.summary.average,
        rating_count: submitted.summary.count,
        user_rating: submitted.user_rating,
    }))
}

/// The caller's current rating of a store.
///
/// GET /api/stores/check?storeId=
pub async fn check(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiQuery(query): ApiQuery<CheckQuery>,
) -> Result<Json<CheckResponse>> {
    let store_id: StoreId = parse_id(
        query.store_id.as_deref().unwrap_or_default(),
        "Invalid store ID",
    )?;

    let rating = RatingService::new(state.repos())
        .get_user_rating(&principal, store_id)
        .await?;

    Ok(Json(CheckResponse {
        rating: rating.map(|r| r.value),
        created_at: rating.map(|r| r.created_at),
    }))
}

/// Ratings of the caller's own store, newest first.
///
/// GET /api/stores/{ownerId}/ratings
#[tracing::instrument(skip(state, principal), fields(user_id = %principal.user_id))]
pub async fn owner_ratings(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(owner_id): Path<String>,
) -> Result<Json<OwnerRatingsResponse>> {
    let owner_id: UserId = parse_id(&owner_id, "Invalid owner ID format")?;

    let owner_ratings = RatingService::new(state.repos())
        .list_ratings_for_owner(&principal, owner_id)
        .await?;

    Ok(Json(OwnerRatingsResponse {
        success: true,
        ratings: owner_ratings
            .ratings
            .into_iter()
            .map(OwnerRatingView::from)
            .collect(),
        average_rating: owner_ratings.summary.average,
        total_ratings: owner_ratings.summary.count,
    }))
}
