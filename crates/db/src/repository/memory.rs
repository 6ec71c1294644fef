//! In-memory account store (useful for testing and local runs).

use std::collections::HashMap;

use agrisense_core::NormalizedPhone;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::AccountStore;
use crate::{Account, AppError, CreateAccountParams};

/// Accounts keyed by canonical phone behind a single lock.
///
/// Every mutation holds the write lock for its whole read-modify-write,
/// which gives the same per-key atomicity as the SQL upsert.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// True if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn upsert_contact(
        &self,
        phone: &NormalizedPhone,
        last_message: &str,
    ) -> Result<Account, AppError> {
        let mut accounts = self.accounts.write().await;
        let now = Utc::now();

        let account = accounts
            .entry(phone.canonical().to_string())
            .and_modify(|account| {
                account.last_message = Some(last_message.to_string());
                account.updated_at = now;
            })
            .or_insert_with(|| {
                debug!(phone = %phone, "Creating shell account");
                Account {
                    id: Uuid::new_v4(),
                    name: None,
                    phone: phone.canonical().to_string(),
                    password_hash: None,
                    last_message: Some(last_message.to_string()),
                    created_at: now,
                    updated_at: now,
                }
            });

        Ok(account.clone())
    }

    async fn create_account(
        &self,
        phone: &NormalizedPhone,
        params: CreateAccountParams<'_>,
    ) -> Result<Account, AppError> {
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(phone.canonical()) {
            return Err(AppError::already_exists("User"));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: Some(params.name.to_string()),
            phone: phone.canonical().to_string(),
            password_hash: Some(params.password_hash.to_string()),
            last_message: None,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(account.phone.clone(), account.clone());

        Ok(account)
    }

    async fn find_by_phone(&self, phone: &NormalizedPhone) -> Result<Account, AppError> {
        self.accounts
            .read()
            .await
            .get(phone.canonical())
            .cloned()
            .ok_or_else(|| AppError::not_found("User"))
    }

    async fn update_credential(
        &self,
        phone: &NormalizedPhone,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(phone.canonical())
            .ok_or_else(|| AppError::not_found("User"))?;

        account.password_hash = Some(password_hash.to_string());
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agrisense_core::normalize;

    use super::*;

    fn phone(raw: &str) -> NormalizedPhone {
        normalize(raw).unwrap()
    }

    fn params<'a>(name: &'a str) -> CreateAccountParams<'a> {
        CreateAccountParams {
            name,
            password_hash: "hash",
        }
    }

    #[tokio::test]
    async fn upsert_creates_shell_then_updates() {
        let store = MemoryAccountStore::new();
        let phone = phone("9876543210");

        let first = store.upsert_contact(&phone, "Sow paddy").await.unwrap();
        assert!(first.is_shell());
        assert!(first.name.is_none());
        assert_eq!(first.last_message.as_deref(), Some("Sow paddy"));

        let second = store.upsert_contact(&phone, "Spray neem oil").await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.last_message.as_deref(), Some("Spray neem oil"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let store = MemoryAccountStore::new();
        let phone = phone("9876543210");

        let first = store.upsert_contact(&phone, "same").await.unwrap();
        let second = store.upsert_contact(&phone, "same").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.last_message.as_deref(), Some("same"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_yield_single_record() {
        let store = Arc::new(MemoryAccountStore::new());
        let phone = phone("+91 70000 00001");

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                let phone = phone.clone();
                tokio::spawn(async move {
                    store
                        .upsert_contact(&phone, &format!("advisory {i}"))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut returned = Vec::with_capacity(handles.len());
        for handle in handles {
            returned.push(handle.await.unwrap());
        }

        assert_eq!(store.len().await, 1);
        assert!(returned.iter().all(|a| a.id == returned[0].id));

        // The stored record is exactly what the last writer saw.
        let stored = store.find_by_phone(&phone).await.unwrap();
        assert!(returned.contains(&stored));
    }

    #[tokio::test]
    async fn create_twice_conflicts() {
        let store = MemoryAccountStore::new();
        let phone = phone("9876543210");

        let account = store.create_account(&phone, params("Asha")).await.unwrap();
        assert_eq!(account.name.as_deref(), Some("Asha"));

        let err = store.create_account(&phone, params("Asha")).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn create_after_shell_upsert_conflicts() {
        let store = MemoryAccountStore::new();
        let phone = phone("9876543210");

        store.upsert_contact(&phone, "hello").await.unwrap();
        let err = store.create_account(&phone, params("Asha")).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn find_missing_is_not_found() {
        let store = MemoryAccountStore::new();
        let err = store.find_by_phone(&phone("9876543210")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_credential_replaces_hash() {
        let store = MemoryAccountStore::new();
        let phone = phone("9876543210");
        store.create_account(&phone, params("Asha")).await.unwrap();

        store.update_credential(&phone, "new-hash").await.unwrap();
        let account = store.find_by_phone(&phone).await.unwrap();
        assert_eq!(account.password_hash.as_deref(), Some("new-hash"));
    }

    #[tokio::test]
    async fn update_credential_missing_is_not_found() {
        let store = MemoryAccountStore::new();
        let err = store
            .update_credential(&phone("9876543210"), "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
