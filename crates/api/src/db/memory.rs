//! In-memory datastore for tests and local runs.
//!
//! All collections live behind one `RwLock`; every trait method takes the
//! lock once, so multi-step writes are atomic with respect to each other.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use storerate_core::{Email, RatingId, RatingSummary, RatingValue, Role, StoreId, UserId};

use super::{ConflictKind, RatingRepository, RepositoryError, StoreRepository, UserRepository};
use crate::models::{
    NewStore, NewUser, OwnerSummary, Rating, RaterRating, Store, StoreFilter, StoreListing, User,
    UserFilter,
};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<UserId, UserRecord>,
    stores: BTreeMap<StoreId, Store>,
    ratings: HashMap<(StoreId, UserId), Rating>,
    next_user_id: i32,
    next_store_id: i32,
    next_rating_id: i32,
}

impl MemoryState {
    fn user_by_email(&self, email: &Email) -> Option<&UserRecord> {
        self.users.values().find(|r| r.user.email == *email)
    }

    fn values_for_store(&self, store_id: StoreId) -> impl Iterator<Item = RatingValue> + '_ {
        self.ratings
            .values()
            .filter(move |r| r.store_id == store_id)
            .map(|r| r.value)
    }
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// Newest first, ties broken by the higher id.
fn newest_first<K: Ord + Copy>(
    a: (DateTime<Utc>, K),
    b: (DateTime<Utc>, K),
) -> std::cmp::Ordering {
    b.0.cmp(&a.0).then(b.1.cmp(&a.1))
}

/// Shared in-memory implementation of every repository trait.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatastore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryDatastore {
    /// Create an empty datastore.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryDatastore {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|r| r.user.clone()))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.user_by_email(email).map(|r| r.user.clone()))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .user_by_email(email)
            .map(|r| (r.user.clone(), r.password_hash.clone())))
    }

    async fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<String>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|r| r.password_hash.clone()))
    }

    async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;

        if state.user_by_email(&new_user.email).is_some() {
            return Err(RepositoryError::Conflict(ConflictKind::UserEmail));
        }

        let user = User {
            id: UserId::new(next_id(&mut state.next_user_id)),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            address: new_user.address.clone(),
            role: new_user.role,
            store_id: None,
            created_at: Utc::now(),
        };

        state.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash: new_user.password_hash.clone(),
            },
        );

        Ok(user)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let record = state
            .users
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))?;
        password_hash.clone_into(&mut record.password_hash);
        Ok(())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|r| filter.matches(&r.user))
            .map(|r| r.user.clone())
            .collect();
        users.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        Ok(users)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let state = self.state.read().await;
        Ok(i64::try_from(state.users.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl StoreRepository for MemoryDatastore {
    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.stores.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<Store>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.stores.values().find(|s| s.email == *email).cloned())
    }

    async fn create_for_owner(&self, new_store: &NewStore) -> Result<Store, RepositoryError> {
        let mut state = self.state.write().await;

        match state.users.get(&new_store.owner_id).map(|r| &r.user) {
            Some(owner) if owner.role == Role::StoreOwner => {
                if owner.store_id.is_some() {
                    return Err(RepositoryError::Conflict(ConflictKind::OwnerHasStore));
                }
            }
            _ => {
                return Err(RepositoryError::NotFound(format!(
                    "store owner {}",
                    new_store.owner_id
                )));
            }
        }

        if state.stores.values().any(|s| s.email == new_store.email) {
            return Err(RepositoryError::Conflict(ConflictKind::StoreEmail));
        }

        let store = Store {
            id: StoreId::new(next_id(&mut state.next_store_id)),
            name: new_store.name.clone(),
            email: new_store.email.clone(),
            address: new_store.address.clone(),
            owner_id: new_store.owner_id,
            created_at: Utc::now(),
        };

        // Both writes happen under the same guard
        state.stores.insert(store.id, store.clone());
        if let Some(owner) = state.users.get_mut(&new_store.owner_id) {
            owner.user.store_id = Some(store.id);
        }

        Ok(store)
    }

    async fn list(&self, filter: &StoreFilter) -> Result<Vec<StoreListing>, RepositoryError> {
        let state = self.state.read().await;
        let mut listings: Vec<StoreListing> = state
            .stores
            .values()
            .filter(|s| filter.matches(s))
            .map(|s| StoreListing {
                store: s.clone(),
                owner: state.users.get(&s.owner_id).map(|r| OwnerSummary {
                    id: r.user.id,
                    name: r.user.name.clone(),
                    email: r.user.email.clone(),
                    address: r.user.address.clone(),
                }),
            })
            .collect();
        listings.sort_by(|a, b| {
            newest_first(
                (a.store.created_at, a.store.id),
                (b.store.created_at, b.store.id),
            )
        });
        Ok(listings)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let state = self.state.read().await;
        Ok(i64::try_from(state.stores.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl RatingRepository for MemoryDatastore {
    async fn upsert(
        &self,
        store_id: StoreId,
        user_id: UserId,
        value: RatingValue,
    ) -> Result<Rating, RepositoryError> {
        let mut state = self.state.write().await;

        if !state.stores.contains_key(&store_id) {
            return Err(RepositoryError::NotFound(format!("store {store_id}")));
        }

        if let Some(existing) = state.ratings.get_mut(&(store_id, user_id)) {
            existing.value = value;
            return Ok(*existing);
        }

        let rating = Rating {
            id: RatingId::new(next_id(&mut state.next_rating_id)),
            store_id,
            user_id,
            value,
            created_at: Utc::now(),
        };
        state.ratings.insert((store_id, user_id), rating);

        Ok(rating)
    }

    async fn get(
        &self,
        store_id: StoreId,
        user_id: UserId,
    ) -> Result<Option<Rating>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.ratings.get(&(store_id, user_id)).copied())
    }

    async fn summary(&self, store_id: StoreId) -> Result<RatingSummary, RepositoryError> {
        let state = self.state.read().await;
        Ok(RatingSummary::from_values(state.values_for_store(store_id)))
    }

    async fn summaries(
        &self,
        store_ids: &[StoreId],
    ) -> Result<HashMap<StoreId, RatingSummary>, RepositoryError> {
        let state = self.state.read().await;
        Ok(store_ids
            .iter()
            .map(|id| (*id, RatingSummary::from_values(state.values_for_store(*id))))
            .filter(|(_, summary)| summary.count > 0)
            .collect())
    }

    async fn values_by_user(
        &self,
        user_id: UserId,
        store_ids: &[StoreId],
    ) -> Result<HashMap<StoreId, RatingValue>, RepositoryError> {
        let state = self.state.read().await;
        Ok(store_ids
            .iter()
            .filter_map(|id| state.ratings.get(&(*id, user_id)).map(|r| (*id, r.value)))
            .collect())
    }

    async fn list_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<RaterRating>, RepositoryError> {
        let state = self.state.read().await;
        let mut ratings: Vec<RaterRating> = state
            .ratings
            .values()
            .filter(|r| r.store_id == store_id)
            .map(|r| {
                let rater = state.users.get(&r.user_id).map(|u| &u.user);
                RaterRating {
                    id: r.id,
                    rater_name: rater.map(|u| u.name.clone()),
                    rater_email: rater.map(|u| u.email.clone()),
                    value: r.value,
                    created_at: r.created_at,
                }
            })
            .collect();
        ratings.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        Ok(ratings)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let state = self.state.read().await;
        Ok(i64::try_from(state.ratings.len()).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Test User".to_owned(),
            email: Email::parse(email).unwrap(),
            password_hash: "$argon2id$test".to_owned(),
            address: "1 Test Lane".to_owned(),
            role,
        }
    }

    fn new_store(owner_id: UserId, email: &str) -> NewStore {
        NewStore {
            name: "Corner Shop".to_owned(),
            email: Email::parse(email).unwrap(),
            address: "2 Market Road".to_owned(),
            owner_id,
        }
    }

    fn stars(v: i64) -> RatingValue {
        RatingValue::new(v).unwrap()
    }

    async fn store_with_owner(db: &MemoryDatastore) -> Store {
        let owner = UserRepository::create(db, &new_user("owner@example.com", Role::StoreOwner))
            .await
            .unwrap();
        db.create_for_owner(&new_store(owner.id, "shop@example.com"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let db = MemoryDatastore::new();
        UserRepository::create(&db, &new_user("a@example.com", Role::User))
            .await
            .unwrap();

        let err = UserRepository::create(&db, &new_user("A@Example.com", Role::User))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Conflict(ConflictKind::UserEmail)
        ));
    }

    #[tokio::test]
    async fn test_aggregate_follows_latest_value_per_user() {
        let db = MemoryDatastore::new();
        let store = store_with_owner(&db).await;
        let a = UserRepository::create(&db, &new_user("a@example.com", Role::User))
            .await
            .unwrap();
        let b = UserRepository::create(&db, &new_user("b@example.com", Role::User))
            .await
            .unwrap();

        db.upsert(store.id, a.id, stars(3)).await.unwrap();
        assert_eq!(
            db.summary(store.id).await.unwrap(),
            RatingSummary {
                average: 3.0,
                count: 1
            }
        );

        db.upsert(store.id, b.id, stars(5)).await.unwrap();
        assert_eq!(
            db.summary(store.id).await.unwrap(),
            RatingSummary {
                average: 4.0,
                count: 2
            }
        );

        db.upsert(store.id, a.id, stars(1)).await.unwrap();
        assert_eq!(
            db.summary(store.id).await.unwrap(),
            RatingSummary {
                average: 3.0,
                count: 2
            }
        );
    }

    #[tokio::test]
    async fn test_resubmission_keeps_record_identity() {
        let db = MemoryDatastore::new();
        let store = store_with_owner(&db).await;
        let user = UserRepository::create(&db, &new_user("a@example.com", Role::User))
            .await
            .unwrap();

        let first = db.upsert(store.id, user.id, stars(4)).await.unwrap();
        let second = db.upsert(store.id, user.id, stars(4)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(RatingRepository::count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_never_duplicate() {
        let db = MemoryDatastore::new();
        let store = store_with_owner(&db).await;
        let user = UserRepository::create(&db, &new_user("a@example.com", Role::User))
            .await
            .unwrap();

        let (store_id, user_id) = (store.id, user.id);
        let handles: Vec<_> = (0..32_i64)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move { db.upsert(store_id, user_id, stars(i % 5 + 1)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(RatingRepository::count(&db).await.unwrap(), 1);
        let stored = db.get(store.id, user.id).await.unwrap().unwrap();
        assert_eq!(db.summary(store.id).await.unwrap().count, 1);
        assert!((1..=5).contains(&stored.value.get()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_raters_all_counted() {
        let db = MemoryDatastore::new();
        let store = store_with_owner(&db).await;

        let mut raters = Vec::new();
        for i in 0..40 {
            let user = UserRepository::create(
                &db,
                &new_user(&format!("rater{i}@example.com"), Role::User),
            )
            .await
            .unwrap();
            raters.push(user.id);
        }

        let store_id = store.id;
        let handles: Vec<_> = raters
            .into_iter()
            .zip(0_i64..)
            .map(|(user_id, i)| {
                let db = db.clone();
                tokio::spawn(async move { db.upsert(store_id, user_id, stars(i % 5 + 1)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            db.summary(store.id).await.unwrap(),
            RatingSummary {
                average: 3.0,
                count: 40
            }
        );
    }

    #[tokio::test]
    async fn test_upsert_unknown_store_is_not_found() {
        let db = MemoryDatastore::new();
        let err = db
            .upsert(StoreId::new(99), UserId::new(1), stars(3))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_for_owner_stamps_owner() {
        let db = MemoryDatastore::new();
        let store = store_with_owner(&db).await;

        let owner = UserRepository::get_by_id(&db, store.owner_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owner.store_id, Some(store.id));
    }

    #[tokio::test]
    async fn test_second_store_for_owner_is_conflict_and_not_persisted() {
        let db = MemoryDatastore::new();
        let store = store_with_owner(&db).await;

        let err = db
            .create_for_owner(&new_store(store.owner_id, "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Conflict(ConflictKind::OwnerHasStore)
        ));
        assert_eq!(StoreRepository::count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_for_plain_user_is_not_found() {
        let db = MemoryDatastore::new();
        let user = UserRepository::create(&db, &new_user("a@example.com", Role::User))
            .await
            .unwrap();

        let err = db
            .create_for_owner(&new_store(user.id, "shop@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_store_email_is_conflict() {
        let db = MemoryDatastore::new();
        store_with_owner(&db).await;
        let second = UserRepository::create(&db, &new_user("o2@example.com", Role::StoreOwner))
            .await
            .unwrap();

        let err = db
            .create_for_owner(&new_store(second.id, "SHOP@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Conflict(ConflictKind::StoreEmail)
        ));

        let second = UserRepository::get_by_id(&db, second.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.store_id, None);
    }

    #[tokio::test]
    async fn test_list_for_store_includes_rater_details() {
        let db = MemoryDatastore::new();
        let store = store_with_owner(&db).await;
        let user = UserRepository::create(&db, &new_user("rater@example.com", Role::User))
            .await
            .unwrap();
        db.upsert(store.id, user.id, stars(2)).await.unwrap();

        let ratings = db.list_for_store(store.id).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].rater_name.as_deref(), Some("Test User"));
        assert_eq!(ratings[0].value, stars(2));
    }
}
