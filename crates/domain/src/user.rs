//! User entity and role enum.

use serde::{Deserialize, Serialize};

use common::UserId;

/// Role a user acts under. A user is either a buyer or a seller; the role is
/// fixed at account creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Buyer,
    Seller,
}

impl UserRole {
    /// Returns the role as its wire/storage string.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Buyer => "buyer",
            UserRole::Seller => "seller",
        }
    }

    /// Parses a storage string back into a role.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buyer" => Some(UserRole::Buyer),
            "seller" => Some(UserRole::Seller),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user as seen by the domain: identity plus role. Credentials stay in the
/// persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl User {
    /// Name used in notifications: the stored name, or the local part of the
    /// email address when no name was set.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.email.split('@').next().unwrap_or(&self.email)
        } else {
            &self.name
        }
    }
}
