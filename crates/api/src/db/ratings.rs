//! Rating ledger for `PostgreSQL`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storerate_core::{Email, RatingId, RatingSummary, RatingValue, StoreId, UserId};

use super::{RatingRepository, RepositoryError};
use crate::models::{RaterRating, Rating};

const RATING_COLUMNS: &str = "id, store_id, user_id, rating, created_at";

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: RatingId,
    store_id: StoreId,
    user_id: UserId,
    rating: RatingValue,
    created_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Self {
            id: row.id,
            store_id: row.store_id,
            user_id: row.user_id,
            value: row.rating,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RaterRatingRow {
    id: RatingId,
    rater_name: Option<String>,
    rater_email: Option<Email>,
    rating: RatingValue,
    created_at: DateTime<Utc>,
}

/// `PostgreSQL` implementation of [`RatingRepository`].
#[derive(Clone)]
pub struct PgRatingRepository {
    pool: PgPool,
}

impl PgRatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn as_raw_ids(ids: &[StoreId]) -> Vec<i32> {
    ids.iter().map(StoreId::as_i32).collect()
}

#[async_trait]
impl RatingRepository for PgRatingRepository {
    async fn upsert(
        &self,
        store_id: StoreId,
        user_id: UserId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Writers to one store queue here, so each cache refresh below sees
        // every rating committed before it
        let locked: Option<(StoreId,)> =
            sqlx::query_as("SELECT id FROM stores WHERE id = $1 FOR UPDATE")
                .bind(store_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound(format!("store {store_id}")));
        }

        let row: RatingRow = sqlx::query_as(&format!(
            r"
            INSERT INTO ratings (store_id, user_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (store_id, user_id)
            DO UPDATE SET rating = EXCLUDED.rating, updated_at = NOW()
            RETURNING {RATING_COLUMNS}
            "
        ))
        .bind(store_id)
        .bind(user_id)
        .bind(value)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound(format!("user {user_id}"))
            }
            other => RepositoryError::Database(other),
        })?;

        // Cached columns only; reads aggregate the ledger directly
        sqlx::query(
            r"
            UPDATE stores
            SET rating = agg.average, rating_count = agg.total
            FROM (
                SELECT COALESCE(ROUND(AVG(rating)::numeric, 1), 0)::float8 AS average,
                       COUNT(*)::int AS total
                FROM ratings
                WHERE store_id = $1
            ) AS agg
            WHERE stores.id = $1
            ",
        )
        .bind(store_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn get(
        &self,
        store_id: StoreId,
        user_id: UserId,
    ) -> Result<Option<Rating>, RepositoryError> {
        let row: Option<RatingRow> = sqlx::query_as(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE store_id = $1 AND user_id = $2"
        ))
        .bind(store_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Rating::from))
    }

    async fn summary(&self, store_id: StoreId) -> Result<RatingSummary, RepositoryError> {
        let (sum, count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(rating), 0)::bigint, COUNT(*) FROM ratings WHERE store_id = $1",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingSummary::from_sum_and_count(sum, count))
    }

    async fn summaries(
        &self,
        store_ids: &[StoreId],
    ) -> Result<HashMap<StoreId, RatingSummary>, RepositoryError> {
        if store_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(StoreId, i64, i64)> = sqlx::query_as(
            r"
            SELECT store_id, COALESCE(SUM(rating), 0)::bigint, COUNT(*)
            FROM ratings
            WHERE store_id = ANY($1)
            GROUP BY store_id
            ",
        )
        .bind(as_raw_ids(store_ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, sum, count)| (id, RatingSummary::from_sum_and_count(sum, count)))
            .collect())
    }

    async fn values_by_user(
        &self,
        user_id: UserId,
        store_ids: &[StoreId],
    ) -> Result<HashMap<StoreId, RatingValue>, RepositoryError> {
        if store_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(StoreId, RatingValue)> = sqlx::query_as(
            "SELECT store_id, rating FROM ratings WHERE user_id = $1 AND store_id = ANY($2)",
        )
        .bind(user_id)
        .bind(as_raw_ids(store_ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn list_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<RaterRating>, RepositoryError> {
        let rows: Vec<RaterRatingRow> = sqlx::query_as(
            r"
            SELECT r.id, u.name AS rater_name, u.email AS rater_email,
                   r.rating, r.created_at
            FROM ratings r
            LEFT JOIN users u ON u.id = r.user_id
            WHERE r.store_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| RaterRating {
                id: row.id,
                rater_name: row.rater_name,
                rater_email: row.rater_email,
                value: row.rating,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ratings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
