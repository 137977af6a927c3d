//! Admin routes: dashboard counts, user and store management.
//!
//! Every handler takes [`RequireAdmin`]. Creating users and stores also
//! re-checks the requester against the identity store inside the service.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storerate_core::{Email, Role, StoreId, UserId};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{StoreFilter, StoreListing, UserFilter};
use crate::routes::types::{IdInput, StoreView, UserView};
use crate::routes::{ApiJson, ApiQuery};
use crate::services::admin::{AdminService, StoreRequest};
use crate::services::auth::NewAccount;
use crate::state::AppState;

/// Platform-wide counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}

/// User listing filters. All are case-insensitive substring matches except
/// `role`, which is exact.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
}

/// Store listing filters.
#[derive(Debug, Deserialize)]
pub struct StoreQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Account created by an admin; any role is allowed.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub address: String,
    pub role: Role,
}

/// Store created by an admin for an existing store owner.
#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    #[serde(alias = "ownerId")]
    pub owner: IdInput,
}

/// Store owners, newest first.
#[derive(Debug, Serialize)]
pub struct StoreOwnersResponse {
    pub user: Vec<UserView>,
    pub message: &'static str,
}

/// Owner summary echoed on store creation.
#[derive(Debug, Serialize)]
pub struct CreatedOwner {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// The store as created.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedStore {
    pub id: StoreId,
    pub name: String,
    pub email: Email,
    pub address: String,
    pub owner: Option<CreatedOwner>,
    pub created_at: DateTime<Utc>,
}

/// Wrapper for [`CreatedStore`].
#[derive(Debug, Serialize)]
pub struct CreatedStoreData {
    pub store: CreatedStore,
}

/// Response of store creation.
#[derive(Debug, Serialize)]
pub struct CreateStoreResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: CreatedStoreData,
}

impl From<StoreListing> for CreatedStore {
    fn from(listing: StoreListing) -> Self {
        let StoreListing { store, owner } = listing;

        Self {
            id: store.id,
            name: store.name,
            email: store.email,
            address: store.address,
            owner: owner.map(|o| CreatedOwner {
                id: o.id,
                name: o.name,
                email: o.email,
            }),
            created_at: store.created_at,
        }
    }
}

/// GET /api/admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<DashboardResponse>> {
    let stats = AdminService::new(state.repos()).dashboard().await?;

    Ok(Json(DashboardResponse {
        total_users: stats.total_users,
        total_stores: stats.total_stores,
        total_ratings: stats.total_ratings,
    }))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<UserView>>> {
    let filter = UserFilter {
        name: query.name,
        email: query.email,
        address: query.address,
        role: query.role,
    };

    let users = AdminService::new(state.repos()).list_users(&filter).await?;

    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// Create an account with any role.
///
/// POST /api/admin/users
#[tracing::instrument(skip(state, admin, req), fields(requester = %admin.user_id, role = %req.role))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>)> {
    let user = AdminService::new(state.repos())
        .create_user(
            &admin,
            NewAccount {
                name: req.name,
                email: req.email,
                password: req.password,
                address: req.address,
                role: req.role,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, "User created by admin");
    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

/// GET /api/admin/store-owners
pub async fn store_owners(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<StoreOwnersResponse>> {
    let owners = AdminService::new(state.repos()).list_store_owners().await?;

    Ok(Json(StoreOwnersResponse {
        user: owners.into_iter().map(UserView::from).collect(),
        message: "Store owners fetched successfully",
    }))
}

/// GET /api/admin/stores
pub async fn list_stores(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiQuery(query): ApiQuery<StoreQuery>,
) -> Result<Json<Vec<StoreView>>> {
    let filter = StoreFilter {
        name: query.name,
        email: query.email,
        address: query.address,
        search: None,
    };

    let stores = AdminService::new(state.repos()).list_stores(&filter).await?;

    Ok(Json(stores.into_iter().map(StoreView::from).collect()))
}

/// Create a store and assign it to a store owner.
///
/// POST /api/admin/stores
pub async fn create_store(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(req): ApiJson<CreateStoreRequest>,
) -> Result<(StatusCode, Json<CreateStoreResponse>)> {
    let owner_id: UserId = req.owner.parse("Invalid owner ID format")?;

    let listing = AdminService::new(state.repos())
        .create_store(
            &admin,
            StoreRequest {
                name: req.name,
                email: req.email,
                address: req.address,
                owner_id,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateStoreResponse {
            success: true,
            message: "Store created successfully",
            data: CreatedStoreData {
                store: CreatedStore::from(listing),
            },
        }),
    ))
}
