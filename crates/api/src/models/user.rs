//! User domain types.

use chrono::{DateTime, Utc};

use storerate_core::{Email, Role, StoreId, UserId};

/// A platform user (domain type).
///
/// The password hash is deliberately absent; it is only read through
/// dedicated credential lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Normalized email address.
    pub email: Email,
    /// Postal address.
    pub address: String,
    /// Role, fixed at creation.
    pub role: Role,
    /// Store assigned to this user (store owners only, set once).
    pub store_id: Option<StoreId>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    /// Argon2 PHC string, never the raw password.
    pub password_hash: String,
    pub address: String,
    pub role: Role,
}

/// Optional filters for listing users.
///
/// Text filters are case-insensitive substring matches; `role` is exact.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
}

impl UserFilter {
    /// Filter matching only store owners.
    #[must_use]
    pub fn store_owners() -> Self {
        Self {
            role: Some(Role::StoreOwner),
            ..Self::default()
        }
    }

    /// Whether `user` passes every set filter.
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        contains_ci(self.name.as_deref(), &user.name)
            && contains_ci(self.email.as_deref(), user.email.as_str())
            && contains_ci(self.address.as_deref(), &user.address)
            && self.role.is_none_or(|role| role == user.role)
    }
}

/// Case-insensitive substring match; an unset or blank needle matches everything.
pub(crate) fn contains_ci(needle: Option<&str>, haystack: &str) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str, address: &str, role: Role) -> User {
        User {
            id: UserId::new(1),
            name: name.to_owned(),
            email: Email::parse(email).unwrap(),
            address: address.to_owned(),
            role,
            store_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let u = user("Ada", "ada@example.com", "1 Main St", Role::User);
        assert!(UserFilter::default().matches(&u));
    }

    #[test]
    fn test_text_filters_are_case_insensitive_substrings() {
        let u = user("Ada Lovelace", "ada@example.com", "1 Main St", Role::User);
        let filter = UserFilter {
            name: Some("LOVE".to_owned()),
            address: Some("main".to_owned()),
            ..UserFilter::default()
        };
        assert!(filter.matches(&u));

        let filter = UserFilter {
            email: Some("bob".to_owned()),
            ..UserFilter::default()
        };
        assert!(!filter.matches(&u));
    }

    #[test]
    fn test_role_filter_is_exact() {
        let owner = user("Olive", "olive@example.com", "2 Side St", Role::StoreOwner);
        let plain = user("Pat", "pat@example.com", "3 Side St", Role::User);
        let filter = UserFilter::store_owners();
        assert!(filter.matches(&owner));
        assert!(!filter.matches(&plain));
    }

    #[test]
    fn test_blank_filter_is_ignored() {
        let u = user("Ada", "ada@example.com", "1 Main St", Role::User);
        let filter = UserFilter {
            name: Some("   ".to_owned()),
            ..UserFilter::default()
        };
        assert!(filter.matches(&u));
    }
}
