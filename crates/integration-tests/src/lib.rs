//! Integration tests for Storerate.
//!
//! Tests drive the full axum router (middleware included) in-process with
//! `tower::ServiceExt::oneshot`, backed by the in-memory datastore. No
//! database or running server is needed, except for the `postgres` tests,
//! which are `#[ignore]`d and exercise the `PostgreSQL` repositories directly.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storerate-integration-tests
//!
//! # PostgreSQL repository tests
//! STORERATE_TEST_DATABASE_URL=postgres://... \
//!     cargo test -p storerate-integration-tests --test postgres -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Registration, login, password changes, protect checks
//! - `ratings` - Store browsing, rating submission and aggregates
//! - `admin` - Dashboard, user and store administration
//! - `postgres` - Rating upserts and store creation against a real database

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use storerate_api::config::ApiConfig;
use storerate_api::db::{MemoryDatastore, Repositories};
use storerate_api::models::{NewStore, Store, User};
use storerate_api::services::auth::{AuthService, NewAccount};
use storerate_api::state::AppState;
use storerate_core::{Email, Role, UserId};

/// Password satisfying the password rule, used for every test account.
pub const PASSWORD: &str = "Secure#Pass1";

const SIGNING_SECRET: &str = "kH7#pQ2$vX9!mN4&wR6*tY8@jL3^bF5%";

/// A user created directly in the datastore, with a signed token.
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.user.id
    }
}

/// An in-process API over a fresh in-memory datastore.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub datastore: MemoryDatastore,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let datastore = MemoryDatastore::new();
        let config = ApiConfig::in_memory(SecretString::from(SIGNING_SECRET));
        let state = AppState::with_repositories(config, Repositories::from_memory(&datastore));

        Self {
            router: storerate_api::app(state.clone()),
            state,
            datastore,
        }
    }

    /// Send a request and return the status with the JSON body
    /// (`Value::Null` when the body is empty or not JSON).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    /// Create an account directly (any role) and sign a token for it.
    pub async fn create_user(&self, email: &str, role: Role) -> TestUser {
        let user = AuthService::new(self.state.repos().users.as_ref())
            .create_account(NewAccount {
                name: "Test Person".to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
                address: "1 Test Lane".to_string(),
                role,
            })
            .await
            .unwrap();
        let token = self.state.tokens().sign(&user).unwrap();

        TestUser { user, token }
    }

    /// Create a store for `owner` directly in the datastore.
    pub async fn create_store(&self, owner: &TestUser, name: &str, email: &str) -> Store {
        self.state
            .repos()
            .stores
            .create_for_owner(&NewStore {
                name: name.to_string(),
                email: Email::parse(email).unwrap(),
                address: format!("{name} Road"),
                owner_id: owner.id(),
            })
            .await
            .unwrap()
    }

    /// Number of records in the rating ledger.
    pub async fn rating_count(&self) -> i64 {
        self.state.repos().ratings.count().await.unwrap()
    }

    /// Number of stores.
    pub async fn store_count(&self) -> i64 {
        self.state.repos().stores.count().await.unwrap()
    }
}
