//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Timeout
//! 6. Rate limiting on login/register (governor)
//!
//! Authentication is not a layer: handlers take [`RequireAuth`],
//! [`OptionalAuth`] or [`RequireAdmin`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, require_role};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
