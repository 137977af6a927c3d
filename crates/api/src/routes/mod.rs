//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Users
//! POST /api/users/register              - Create an account (not admin)
//! POST /api/users/login                 - Exchange credentials for a token
//! PUT  /api/users/update-password/{id}  - Change own password (auth)
//! GET  /api/users/user-protect          - Token check (auth)
//! GET  /api/users/admin-protect         - Token check (admin)
//!
//! # Stores
//! GET  /api/stores                      - Browse stores (optional auth)
//! POST /api/stores/ratings              - Submit or replace a rating (auth)
//! GET  /api/stores/check?storeId=       - Own rating of a store (auth)
//! GET  /api/stores/{ownerId}/ratings    - Ratings of own store (owner)
//!
//! # Admin (admin only)
//! GET  /api/admin/dashboard             - Platform counts
//! GET  /api/admin/users                 - List users with filters
//! POST /api/admin/users                 - Create a user with any role
//! GET  /api/admin/store-owners          - List store owners
//! GET  /api/admin/stores                - List stores with filters
//! POST /api/admin/stores                - Create a store for an owner
//! ```

pub mod admin;
pub mod stores;
pub mod types;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the API error shape.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Create the user routes router.
///
/// Registration and login sit behind the per-IP rate limiter when
/// `rate_limit_auth` is set.
pub fn user_routes(rate_limit_auth: bool) -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login));

    let credentials = if rate_limit_auth {
        credentials.layer(auth_rate_limiter())
    } else {
        credentials
    };

    Router::new()
        .merge(credentials)
        .route("/update-password/{id}", put(users::update_password))
        .route("/user-protect", get(users::user_protect))
        .route("/admin-protect", get(users::admin_protect))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/ratings", post(stores::submit_rating))
        .route("/check", get(stores::check))
        .route("/{owner_id}/ratings", get(stores::owner_ratings))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/store-owners", get(admin::store_owners))
        .route("/stores", get(admin::list_stores).post(admin::create_store))
}

/// Create all routes for the API.
pub fn routes(rate_limit_auth: bool) -> Router<AppState> {
    let api = Router::new()
        .nest("/users", user_routes(rate_limit_auth))
        .nest("/stores", store_routes())
        .nest("/admin", admin_routes());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity when running against `PostgreSQL`.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
