//! Store repository for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storerate_core::{Email, Role, StoreId, UserId};

use super::{
    ConflictKind, RepositoryError, StoreRepository, like_pattern, map_unique_violation,
};
use crate::models::{NewStore, OwnerSummary, Store, StoreFilter, StoreListing};

const STORE_COLUMNS: &str = "id, name, email, address, owner_id, created_at";

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    email: Email,
    address: String,
    owner_id: UserId,
    created_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            address: row.address,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StoreListingRow {
    #[sqlx(flatten)]
    store: StoreRow,
    owner_user_id: Option<UserId>,
    owner_name: Option<String>,
    owner_email: Option<Email>,
    owner_address: Option<String>,
}

impl From<StoreListingRow> for StoreListing {
    fn from(row: StoreListingRow) -> Self {
        let owner = match (
            row.owner_user_id,
            row.owner_name,
            row.owner_email,
            row.owner_address,
        ) {
            (Some(id), Some(name), Some(email), Some(address)) => Some(OwnerSummary {
                id,
                name,
                email,
                address,
            }),
            _ => None,
        };

        Self {
            store: row.store.into(),
            owner,
        }
    }
}

/// Conflict kind for a violated unique index on `stores`.
fn store_conflict(constraint: Option<&str>) -> ConflictKind {
    match constraint {
        Some("stores_owner_id_key" | "users_store_id_key") => ConflictKind::OwnerHasStore,
        _ => ConflictKind::StoreEmail,
    }
}

/// `PostgreSQL` implementation of [`StoreRepository`].
#[derive(Clone)]
pub struct PgStoreRepository {
    pool: PgPool,
}

impl PgStoreRepository {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRepository for PgStoreRepository {
    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row: Option<StoreRow> =
            sqlx::query_as(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Store::from))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<Store>, RepositoryError> {
        let row: Option<StoreRow> = sqlx::query_as(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    async fn create_for_owner(&self, new_store: &NewStore) -> Result<Store, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the owner row so concurrent assignments serialize on it
        let owner: Option<(Role, Option<StoreId>)> =
            sqlx::query_as("SELECT role, store_id FROM users WHERE id = $1 FOR UPDATE")
                .bind(new_store.owner_id)
                .fetch_optional(&mut *tx)
                .await?;

        match owner {
            Some((Role::StoreOwner, None)) => {}
            Some((Role::StoreOwner, Some(_))) => {
                return Err(RepositoryError::Conflict(ConflictKind::OwnerHasStore));
            }
            Some((Role::User | Role::Admin, _)) | None => {
                return Err(RepositoryError::NotFound(format!(
                    "store owner {}",
                    new_store.owner_id
                )));
            }
        }

        let row: StoreRow = sqlx::query_as(&format!(
            r"
            INSERT INTO stores (name, email, address, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(&new_store.name)
        .bind(&new_store.email)
        .bind(&new_store.address)
        .bind(new_store.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, store_conflict))?;

        let stamped = sqlx::query(
            r"
            UPDATE users
            SET store_id = $1, updated_at = NOW()
            WHERE id = $2 AND store_id IS NULL
            ",
        )
        .bind(row.id)
        .bind(new_store.owner_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, store_conflict))?;

        if stamped.rows_affected() == 0 {
            // Dropping `tx` rolls back the insert
            return Err(RepositoryError::Conflict(ConflictKind::OwnerHasStore));
        }

        tx.commit().await?;

        Ok(row.into())
    }

    async fn list(&self, filter: &StoreFilter) -> Result<Vec<StoreListing>, RepositoryError> {
        let rows: Vec<StoreListingRow> = sqlx::query_as(
            r"
            SELECT s.id, s.name, s.email, s.address, s.owner_id, s.created_at,
                   u.id AS owner_user_id,
                   u.name AS owner_name,
                   u.email AS owner_email,
                   u.address AS owner_address
            FROM stores s
            LEFT JOIN users u ON u.id = s.owner_id
            WHERE ($1::text IS NULL OR s.name ILIKE $1 OR s.address ILIKE $1)
              AND ($2::text IS NULL OR s.name ILIKE $2)
              AND ($3::text IS NULL OR s.email ILIKE $3)
              AND ($4::text IS NULL OR s.address ILIKE $4)
            ORDER BY s.created_at DESC, s.id DESC
            ",
        )
        .bind(like_pattern(filter.search.as_deref()))
        .bind(like_pattern(filter.name.as_deref()))
        .bind(like_pattern(filter.email.as_deref()))
        .bind(like_pattern(filter.address.as_deref()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoreListing::from).collect())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflict_messages() {
        assert_eq!(
            store_conflict(Some("stores_owner_id_key")),
            ConflictKind::OwnerHasStore
        );
        assert_eq!(
            store_conflict(Some("users_store_id_key")),
            ConflictKind::OwnerHasStore
        );
        assert_eq!(
            store_conflict(Some("stores_email_key")),
            ConflictKind::StoreEmail
        );
        assert_eq!(store_conflict(None), ConflictKind::StoreEmail);
    }
}
