//! Account directory for the alert service.
//!
//! Provides:
//! - A storage seam ([`AccountStore`]) with PostgreSQL and in-memory backends
//! - The shared [`Directory`] handle every request handler goes through
//! - Connection pool management via [`create_pool`]
//!
//! # Example
//!
//! ```ignore
//! use agrisense_db::{DbConfig, Directory};
//!
//! let directory = Directory::connect(&DbConfig::from_url("postgres://localhost/agrisense")).await?;
//! let phone = agrisense_core::normalize("+91 98765 43210")?;
//! let account = directory.find_by_phone(&phone).await?;
//! ```

#![expect(clippy::doc_markdown, reason = "SQLx capitalization is intentional")]

mod models;
mod repository;

use agrisense_core::AppError;

/// Database error wrapper for ergonomic error conversion.
///
/// Wraps `sqlx::Error` so `?` turns any query failure into
/// `AppError::Unavailable`.
#[derive(Debug)]
struct DbError(sqlx::Error);

impl From<sqlx::Error> for DbError {
    #[inline]
    fn from(e: sqlx::Error) -> Self {
        Self(e)
    }
}

impl From<DbError> for AppError {
    #[inline]
    fn from(e: DbError) -> Self {
        Self::Unavailable(e.0.to_string())
    }
}

pub use models::{Account, AccountSummary, CreateAccountParams};

pub use repository::{
    AccountStore, DbConfig, Directory, MemoryAccountStore, PgAccountStore, create_pool,
};

#[cfg(test)]
mod tests {
    use agrisense_core::{normalize, password};

    use super::*;

    #[tokio::test]
    async fn directory_verifies_credentials_without_exposing_them() {
        let directory = Directory::in_memory();
        let phone = normalize("9876543210").unwrap();
        let hash = password::hash("monsoon").unwrap();

        let account = directory
            .create_account(
                &phone,
                CreateAccountParams {
                    name: "Kiran",
                    password_hash: &hash,
                },
            )
            .await
            .unwrap();

        let stored = account.password_hash.as_deref().unwrap();
        assert!(directory.verify_credential("monsoon", stored));
        assert!(!directory.verify_credential("drought", stored));
    }

    #[tokio::test]
    async fn shell_then_signup_then_reset() {
        let directory = Directory::in_memory();
        let phone = normalize("+91 91234 56789").unwrap();

        directory.upsert_contact(&phone, "Rain expected").await.unwrap();

        let err = directory
            .create_account(
                &phone,
                CreateAccountParams {
                    name: "Kiran",
                    password_hash: "h",
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        directory.update_credential(&phone, "h2").await.unwrap();
        let account = directory.find_by_phone(&phone).await.unwrap();
        assert_eq!(account.password_hash.as_deref(), Some("h2"));
        assert_eq!(account.last_message.as_deref(), Some("Rain expected"));
    }

    #[tokio::test]
    async fn in_memory_backend_reports_healthy() {
        let directory = Directory::in_memory();
        assert_eq!(directory.backend(), "memory");
        assert!(directory.health_check().await);
    }
}
