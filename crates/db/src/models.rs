//! Account model and parameter types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Account row keyed by canonical phone.
///
/// `name` and `password_hash` are absent for shell accounts created by a
/// notification send to an unregistered number.
#[derive(Clone, PartialEq, Eq, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: String,
    pub password_hash: Option<String>,
    pub last_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Public projection returned to clients.
    #[must_use]
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            name: self.name.clone(),
            phone: self.phone.clone(),
        }
    }

    /// True if the account has never been through signup.
    #[inline]
    #[must_use]
    pub const fn is_shell(&self) -> bool {
        self.password_hash.is_none()
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("has_password", &self.password_hash.is_some())
            .field("last_message", &self.last_message)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Account fields safe to expose over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: String,
}

/// Parameters for creating a login-capable account.
#[derive(Debug, Clone, Copy)]
pub struct CreateAccountParams<'a> {
    pub name: &'a str,
    pub password_hash: &'a str,
}
