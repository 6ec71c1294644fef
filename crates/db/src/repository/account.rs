//! PostgreSQL account store on the `accounts` table.

use agrisense_core::NormalizedPhone;
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::AccountStore;
use crate::{Account, AppError, CreateAccountParams, DbError};

/// Account store for database operations on `accounts`.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn upsert_contact(
        &self,
        phone: &NormalizedPhone,
        last_message: &str,
    ) -> Result<Account, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r"
            INSERT INTO accounts (id, phone, last_message)
            VALUES ($1, $2, $3)
            ON CONFLICT (phone) DO UPDATE
               SET last_message = EXCLUDED.last_message,
                   updated_at = NOW()
            RETURNING id, name, phone, password_hash, last_message, created_at, updated_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(phone.canonical())
        .bind(last_message)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError)?;

        Ok(account)
    }

    async fn create_account(
        &self,
        phone: &NormalizedPhone,
        params: CreateAccountParams<'_>,
    ) -> Result<Account, AppError> {
        // The unique key decides; no row back means the phone was taken.
        sqlx::query_as::<_, Account>(
            r"
            INSERT INTO accounts (id, name, phone, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (phone) DO NOTHING
            RETURNING id, name, phone, password_hash, last_message, created_at, updated_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(params.name)
        .bind(phone.canonical())
        .bind(params.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError)?
        .ok_or_else(|| AppError::already_exists("User"))
    }

    async fn find_by_phone(&self, phone: &NormalizedPhone) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            r"
            SELECT id, name, phone, password_hash, last_message, created_at, updated_at
              FROM accounts
             WHERE phone = $1
            ",
        )
        .bind(phone.canonical())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError)?
        .ok_or_else(|| AppError::not_found("User"))
    }

    async fn update_credential(
        &self,
        phone: &NormalizedPhone,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r"
            UPDATE accounts
               SET password_hash = $2,
                   updated_at = NOW()
             WHERE phone = $1
            ",
        )
        .bind(phone.canonical())
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(DbError)?;

        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(AppError::not_found("User"))
        }
    }

    async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

// These run against a live server: `DB_URL=postgres://… cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use agrisense_core::normalize;

    use super::*;
    use crate::{DbConfig, create_pool};

    async fn store() -> PgAccountStore {
        let url = std::env::var("DB_URL").expect("DB_URL must name a test database");
        let pool = create_pool(&DbConfig::from_url(url)).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        PgAccountStore::new(pool)
    }

    /// A number no earlier run has used.
    fn fresh_phone() -> NormalizedPhone {
        let suffix = Uuid::new_v4().as_u128() % 1_000_000_000;
        normalize(&format!("9{suffix:09}")).unwrap()
    }

    fn params(name: &str) -> CreateAccountParams<'_> {
        CreateAccountParams {
            name,
            password_hash: "$argon2id$stub",
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires DB_URL"]
    async fn concurrent_upserts_yield_single_row() {
        let store = store().await;
        let phone = fresh_phone();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
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
        assert!(returned.iter().all(|a| a.id == returned[0].id));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE phone = $1")
            .bind(phone.canonical())
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let stored = store.find_by_phone(&phone).await.unwrap();
        assert!(stored.is_shell());
        assert!(returned.iter().any(|a| a.last_message == stored.last_message));
    }

    #[tokio::test]
    #[ignore = "requires DB_URL"]
    async fn create_is_decided_by_unique_phone() {
        let store = store().await;
        let phone = fresh_phone();

        let (first, second) = tokio::join!(
            store.create_account(&phone, params("Asha")),
            store.create_account(&phone, params("Ravi")),
        );
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(AppError::AlreadyExists(_))))
        );

        let shell = fresh_phone();
        store.upsert_contact(&shell, "Sow paddy").await.unwrap();
        let err = store
            .create_account(&shell, params("Asha"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    #[ignore = "requires DB_URL"]
    async fn credential_update_and_lookup() {
        let store = store().await;
        let phone = fresh_phone();

        let err = store.find_by_phone(&phone).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = store.update_credential(&phone, "hash").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        store.upsert_contact(&phone, "Rain tonight").await.unwrap();
        store.update_credential(&phone, "new-hash").await.unwrap();

        let account = store.find_by_phone(&phone).await.unwrap();
        assert_eq!(account.password_hash.as_deref(), Some("new-hash"));
        assert_eq!(account.last_message.as_deref(), Some("Rain tonight"));
        assert!(store.health_check().await);
    }
}
