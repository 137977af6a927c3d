//! User roles.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known role.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0} (expected user, admin or store_owner)")]
pub struct RoleParseError(pub String);

/// Platform role.
///
/// Roles are assigned at account creation and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular customer: browses stores and submits ratings.
    #[default]
    User,
    /// Platform administrator: manages users and stores.
    Admin,
    /// Owns exactly one store and sees its individual ratings.
    StoreOwner,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 3] = [Self::User, Self::Admin, Self::StoreOwner];

    /// Canonical string form, identical to the serde and database encodings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::StoreOwner => "store_owner",
        }
    }

    /// Whether an anonymous visitor may pick this role when signing up.
    ///
    /// Admin accounts can only be created by another admin or the CLI.
    #[must_use]
    pub const fn is_self_assignable(self) -> bool {
        match self {
            Self::User | Self::StoreOwner => true,
            Self::Admin => false,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "store_owner" => Ok(Self::StoreOwner),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_from_str_agree() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_serde_matches_as_str() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }

    #[test]
    fn test_admin_not_self_assignable() {
        assert!(Role::User.is_self_assignable());
        assert!(Role::StoreOwner.is_self_assignable());
        assert!(!Role::Admin.is_self_assignable());
    }

    #[test]
    fn test_default_is_user() {
        assert_eq!(Role::default(), Role::User);
    }
}
