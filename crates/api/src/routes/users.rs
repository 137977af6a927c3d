//! Account routes: registration, login, password changes and the
//! protect-check endpoints used by clients to validate a stored token.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use storerate_core::{Role, UserId};

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::User;
use crate::routes::ApiJson;
use crate::routes::types::{UserView, parse_id};
use crate::services::auth::NewAccount;
use crate::state::AppState;

/// Registration form. `role` defaults to `user`.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change form.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Token plus the public user view, returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserView,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: &'static str,
}

/// Response of the protect-check endpoints.
#[derive(Debug, Serialize)]
pub struct ProtectResponse {
    pub ok: bool,
}

fn issue(state: &AppState, user: User) -> Result<Json<AuthResponse>> {
    let token = state.tokens().sign(&user)?;

    Ok(Json(AuthResponse {
        success: true,
        token,
        user: UserView::from(user),
    }))
}

/// Register a new account and sign it in.
///
/// POST /api/users/register
#[tracing::instrument(skip(state, req), fields(role))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let role = req.role.unwrap_or_default();
    tracing::Span::current().record("role", role.as_str());

    let user = state
        .auth()
        .register(NewAccount {
            name: req.name,
            email: req.email,
            password: req.password,
            address: req.address,
            role,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    issue(&state, user)
}

/// Exchange credentials for a token.
///
/// POST /api/users/login
#[tracing::instrument(skip(state, req))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = state.auth().login(&req.email, &req.password).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    issue(&state, user)
}

/// Change the caller's own password.
///
/// PUT /api/users/update-password/{id}
#[tracing::instrument(skip(state, principal, req), fields(user_id = %principal.user_id))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let target: UserId = parse_id(&id, "Invalid user ID format")?;

    state
        .auth()
        .update_password(&principal, target, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        msg: "Password updated successfully",
    }))
}

/// GET /api/users/user-protect
pub async fn user_protect(RequireAuth(_): RequireAuth) -> Json<ProtectResponse> {
    Json(ProtectResponse { ok: true })
}

/// GET /api/users/admin-protect
pub async fn admin_protect(RequireAdmin(_): RequireAdmin) -> Json<ProtectResponse> {
    Json(ProtectResponse { ok: true })
}
