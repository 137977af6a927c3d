//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::db::Repositories;
use crate::services::auth::AuthService;
use crate::services::tokens::TokenService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the repositories, the token service and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    repos: Repositories,
    tokens: TokenService,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(config: ApiConfig, pool: PgPool) -> Self {
        let repos = Repositories::postgres(&pool);
        Self::build(config, repos, Some(pool))
    }

    /// Create application state over the given repositories, with no pool.
    #[must_use]
    pub fn with_repositories(config: ApiConfig, repos: Repositories) -> Self {
        Self::build(config, repos, None)
    }

    fn build(config: ApiConfig, repos: Repositories, pool: Option<PgPool>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                tokens,
                pool,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the repositories.
    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// The database pool, when running against `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Authentication service over the user repository.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.inner.repos.users.as_ref())
    }
}
