//! Connection settings for the PostgreSQL directory.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::debug;

use crate::AppError;

/// `application_name` reported to the server, visible in `pg_stat_activity`.
const APPLICATION_NAME: &str = "agrisense-service";

/// Pool settings plus the connection URL, which may embed a password.
#[derive(Clone)]
#[must_use]
pub struct DbConfig {
    url: SecretString,
    pub pool_min: u32,
    pub pool_max: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_POOL_MIN: u32 = 1;
    pub const DEFAULT_POOL_MAX: u32 = 10;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: SecretString::from(url.into()),
            pool_min: Self::DEFAULT_POOL_MIN,
            pool_max: Self::DEFAULT_POOL_MAX,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn with_pool(mut self, min: u32, max: u32) -> Self {
        self.pool_min = min;
        self.pool_max = max;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Connection URL including any credentials.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.expose_secret()
    }

    fn connect_options(&self) -> Result<PgConnectOptions, AppError> {
        self.url()
            .parse::<PgConnectOptions>()
            .map(|options| options.application_name(APPLICATION_NAME))
            .map_err(|e| AppError::InvalidArgument(format!("Invalid database URL: {e}")))
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &"[REDACTED]")
            .field("pool_min", &self.pool_min)
            .field("pool_max", &self.pool_max)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

/// Open a pool; the URL is parsed before any connection is attempted.
///
/// # Errors
/// `InvalidArgument` for an unparsable URL, `Unavailable` when the server
/// cannot be reached within the acquire timeout.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool, AppError> {
    let options = config.connect_options()?;
    debug!(
        pool_min = config.pool_min,
        pool_max = config.pool_max,
        "Opening database pool"
    );

    PgPoolOptions::new()
        .min_connections(config.pool_min)
        .max_connections(config.pool_max)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| AppError::Unavailable(format!("Database connection failed: {e}")))
}
