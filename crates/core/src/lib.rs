//! Storerate Core - Shared types library.
//!
//! This crate provides common types used across all Storerate components:
//! - `api` - JSON API server (users, stores, ratings, administration)
//! - `cli` - Command-line tools for migrations and bootstrapping
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles, and ratings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
