//! Account directory with pluggable storage backends.
//!
//! # Error Handling
//!
//! All store methods return `Result<T, AppError>` where errors are:
//! - `AppError::Unavailable` - Storage connection or query failures
//! - `AppError::NotFound` - No account for the phone number
//! - `AppError::AlreadyExists` - Phone number already taken (creation only)
//!
//! Nothing is retried here; every failure goes straight back to the caller.

#![expect(
    clippy::missing_errors_doc,
    reason = "error handling documented at module level"
)]

mod account;
mod config;
mod memory;

use std::sync::Arc;

use agrisense_core::{NormalizedPhone, password};
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::info;

use crate::{Account, AppError, CreateAccountParams};

pub use account::PgAccountStore;
pub use config::{DbConfig, create_pool};
pub use memory::MemoryAccountStore;

/// Storage backend for accounts.
///
/// Implementations must make `upsert_contact` atomic per phone number and
/// must decide `create_account` conflicts with a unique key, never with a
/// separate existence check.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a shell account or replace `last_message` on the existing one.
    async fn upsert_contact(
        &self,
        phone: &NormalizedPhone,
        last_message: &str,
    ) -> Result<Account, AppError>;

    /// Create a login-capable account; `AlreadyExists` if the phone is taken.
    async fn create_account(
        &self,
        phone: &NormalizedPhone,
        params: CreateAccountParams<'_>,
    ) -> Result<Account, AppError>;

    /// Exact lookup by canonical phone.
    async fn find_by_phone(&self, phone: &NormalizedPhone) -> Result<Account, AppError>;

    /// Replace the stored credential hash.
    async fn update_credential(
        &self,
        phone: &NormalizedPhone,
        password_hash: &str,
    ) -> Result<(), AppError>;

    /// Check backend health.
    async fn health_check(&self) -> bool;
}

/// Shared account directory handle.
///
/// Cheap to clone; every clone talks to the same backend.
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn AccountStore>,
    backend: &'static str,
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl Directory {
    /// Directory backed by an existing PostgreSQL pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            store: Arc::new(PgAccountStore::new(pool)),
            backend: "postgres",
        }
    }

    /// Connect to PostgreSQL and apply pending migrations.
    pub async fn connect(config: &DbConfig) -> Result<Self, AppError> {
        let pool = create_pool(config).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Migration failed: {e}")))?;
        info!("Database migrations applied");
        Ok(Self::postgres(pool))
    }

    /// Process-local directory, lost on restart.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryAccountStore::new()),
            backend: "memory",
        }
    }

    /// Name of the active backend.
    #[inline]
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        self.backend
    }

    pub async fn upsert_contact(
        &self,
        phone: &NormalizedPhone,
        last_message: &str,
    ) -> Result<Account, AppError> {
        self.store.upsert_contact(phone, last_message).await
    }

    pub async fn create_account(
        &self,
        phone: &NormalizedPhone,
        params: CreateAccountParams<'_>,
    ) -> Result<Account, AppError> {
        self.store.create_account(phone, params).await
    }

    pub async fn find_by_phone(&self, phone: &NormalizedPhone) -> Result<Account, AppError> {
        self.store.find_by_phone(phone).await
    }

    pub async fn update_credential(
        &self,
        phone: &NormalizedPhone,
        password_hash: &str,
    ) -> Result<(), AppError> {
        self.store.update_credential(phone, password_hash).await
    }

    /// Check a plaintext password against a stored hash.
    #[must_use]
    pub fn verify_credential(&self, password: &str, password_hash: &str) -> bool {
        password::verify(password, password_hash)
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }
}
