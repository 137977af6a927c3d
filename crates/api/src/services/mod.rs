//! Business logic services for the API.
//!
//! # Services
//!
//! - `auth` - Account creation, password login and password changes
//! - `tokens` - Bearer token issuance and verification
//! - `ratings` - Rating submission, aggregation and store browsing
//! - `admin` - User/store administration and dashboard counts
//!
//! Services borrow the shared repositories for the duration of a request
//! and take the caller's [`Principal`](crate::models::Principal) explicitly.

pub mod admin;
pub mod auth;
pub mod ratings;
pub mod tokens;
