//! Authentication extractors.
//!
//! Bearer tokens are verified once per request and the decoded
//! [`Principal`] is handed to the handler as an ordinary value.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use storerate_core::Role;

use crate::error::{AppError, set_sentry_user};
use crate::models::Principal;
use crate::state::AppState;

fn invalid_format() -> AppError {
    AppError::Unauthorized("Unauthorized - Invalid token format".to_string())
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `Ok(None)` when the header is absent and an error when it is
/// present but not a usable bearer credential.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| invalid_format())?;
    let (scheme, token) = value.split_once(' ').ok_or_else(invalid_format)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(invalid_format());
    }

    Ok(Some(token))
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Option<Principal>, AppError> {
    let Some(token) = bearer_token(parts)? else {
        return Ok(None);
    };

    let principal = state.tokens().verify(token)?;
    set_sentry_user(&principal.user_id);

    Ok(Some(principal))
}

/// Fail with `Forbidden` unless the token-derived role is `role`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` on a role mismatch.
pub fn require_role(principal: &Principal, role: Role) -> Result<(), AppError> {
    if principal.has_role(role) {
        return Ok(());
    }

    tracing::debug!(
        user_id = %principal.user_id,
        role = %principal.role,
        required = %role,
        "Role check failed"
    );

    Err(AppError::Forbidden(match role {
        Role::Admin => "Admin access required".to_string(),
        Role::StoreOwner => "Store owner access required".to_string(),
        Role::User => "User access required".to_string(),
    }))
}

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 when the token is missing, malformed or fails
/// verification.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(principal): RequireAuth) -> String {
///     format!("Hello, user {}!", principal.user_id)
/// }
/// ```
pub struct RequireAuth(pub Principal);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)?.map(Self).ok_or_else(|| {
            AppError::Unauthorized("Unauthorized - No token provided".to_string())
        })
    }
}

/// Extractor that optionally authenticates the caller.
///
/// A missing header yields `None`; a header carrying a bad token is still
/// rejected with 401.
pub struct OptionalAuth(pub Option<Principal>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

/// Extractor that requires a valid token carrying the admin role.
///
/// Rejects with 401 for authentication failures and 403 for other roles.
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(principal) = RequireAuth::from_request_parts(parts, state).await?;
        require_role(&principal, Role::Admin)?;
        Ok(Self(principal))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use storerate_core::UserId;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/stores");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(None)).unwrap(), None);
        assert_eq!(
            bearer_token(&parts_with(Some("Bearer abc.def.ghi"))).unwrap(),
            Some("abc.def.ghi")
        );
        assert_eq!(
            bearer_token(&parts_with(Some("bearer abc"))).unwrap(),
            Some("abc")
        );
        assert!(bearer_token(&parts_with(Some("Basic dXNlcjpwYXNz"))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer "))).is_err());
        assert!(bearer_token(&parts_with(Some("abc.def.ghi"))).is_err());
    }

    #[test]
    fn test_require_role() {
        let user = Principal {
            user_id: UserId::new(1),
            role: Role::User,
        };
        let owner = Principal {
            role: Role::StoreOwner,
            ..user
        };
        let admin = Principal {
            role: Role::Admin,
            ..user
        };

        assert!(require_role(&admin, Role::Admin).is_ok());
        for principal in [user, owner] {
            let err = require_role(&principal, Role::Admin).unwrap_err();
            assert_eq!(err.status(), StatusCode::FORBIDDEN);
            assert_eq!(err.client_message(), "Admin access required");
        }
    }
}
