//! Seed the database with demo data.
//!
//! Creates two store owners with one store each, two regular users, and a
//! handful of ratings so the store browser and owner view have something
//! to show. Running it twice is a no-op. Every demo account signs in with
//! the password `Demo#Pass1`.

use storerate_api::db::{self, Repositories};
use storerate_api::models::{NewStore, Principal, User};
use storerate_api::services::auth::{AuthService, NewAccount};
use storerate_api::services::ratings::RatingService;
use storerate_core::{Email, Role};
use tracing::info;

/// Shared password for every demo account.
const DEMO_PASSWORD: &str = "Demo#Pass1";

/// Present once the seed has run.
const SEED_MARKER_EMAIL: &str = "olivia@demo.storerate.test";

const OWNERS: &[(&str, &str, &str)] = &[
    ("Olivia Baker", "olivia@demo.storerate.test", "12 Baker Street"),
    ("Marcus Green", "marcus@demo.storerate.test", "48 Orchard Lane"),
];

const STORES: &[(&str, &str, &str)] = &[
    ("Corner Bakery", "bakery@demo.storerate.test", "12 Baker Street"),
    ("Green Grocer", "grocer@demo.storerate.test", "48 Orchard Lane"),
];

const USERS: &[(&str, &str, &str)] = &[
    ("Alice Walker", "alice@demo.storerate.test", "3 Elm Street"),
    ("Bob Fisher", "bob@demo.storerate.test", "7 River Road"),
];

/// Ratings as `(user index, store index, value)`.
const RATINGS: &[(usize, usize, i64)] = &[(0, 0, 5), (1, 0, 4), (0, 1, 3), (1, 1, 2)];

/// Seed demo owners, stores, users and ratings.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the database is
/// unreachable or any insert fails.
pub async fn demo_data() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url().ok_or("STORERATE_DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let repos = Repositories::postgres(&pool);
    let auth = AuthService::new(repos.users.as_ref());

    let marker = Email::parse(SEED_MARKER_EMAIL)?;
    if repos.users.get_by_email(&marker).await?.is_some() {
        info!("Demo data already present, nothing to do");
        return Ok(());
    }

    let mut users: Vec<User> = Vec::with_capacity(USERS.len());
    for &(name, email, address) in USERS {
        users.push(create(&auth, name, email, address, Role::User).await?);
    }

    let mut store_ids = Vec::with_capacity(STORES.len());
    for (&(owner_name, owner_email, owner_address), &(name, email, address)) in
        OWNERS.iter().zip(STORES)
    {
        let owner = create(&auth, owner_name, owner_email, owner_address, Role::StoreOwner).await?;

        let store = repos
            .stores
            .create_for_owner(&NewStore {
                name: name.to_owned(),
                email: Email::parse(email)?,
                address: address.to_owned(),
                owner_id: owner.id,
            })
            .await?;

        info!(store_id = %store.id, name = %store.name, "Store created");
        store_ids.push(store.id);
    }

    let ratings = RatingService::new(&repos);
    for &(user_index, store_index, value) in RATINGS {
        let (Some(user), Some(&store_id)) = (users.get(user_index), store_ids.get(store_index))
        else {
            continue;
        };

        let principal = Principal {
            user_id: user.id,
            role: user.role,
        };
        ratings.submit_rating(&principal, store_id, value).await?;
    }

    info!("Seeding complete!");
    info!("  Users: {}", USERS.len() + OWNERS.len());
    info!("  Stores: {}", store_ids.len());
    info!("  Ratings: {}", RATINGS.len());

    Ok(())
}

async fn create(
    auth: &AuthService<'_>,
    name: &str,
    email: &str,
    address: &str,
    role: Role,
) -> Result<User, Box<dyn std::error::Error>> {
    let user = auth
        .create_account(NewAccount {
            name: name.to_owned(),
            email: email.to_owned(),
            password: DEMO_PASSWORD.to_owned(),
            address: address.to_owned(),
            role,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "User created");
    Ok(user)
}
