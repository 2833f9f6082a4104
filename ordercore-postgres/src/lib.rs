//! PostgreSQL adapter for the OrderCore storage contract.
//!
//! Every [`OrderStore::begin`] opens a database transaction at the server's
//! default isolation (read committed). Stock reservations and the PENDING to
//! PAID flip are single conditional `UPDATE` statements; PostgreSQL re-checks
//! their predicates after waiting on a row lock, which is what keeps
//! concurrent orders from overselling and concurrent payments from settling
//! twice.

mod rows;
mod transaction;

use std::env;
use std::num::NonZeroU32;
use std::time::Duration;

use nutype::nutype;
use ordercore_types::{Operation, OrderStore, StoreError};
use sqlx::{Pool, Postgres, postgres::PgPoolOptions, query};
use thiserror::Error;
use tracing::{error, instrument, warn};

pub use transaction::PostgresTransaction;

#[derive(Debug, Error)]
pub enum PostgresStoreError {
    #[error("failed to create postgres connection pool")]
    ConnectionFailed(#[source] sqlx::Error),

    #[error("postgres health check failed")]
    PingFailed(#[source] sqlx::Error),

    #[error("failed to apply ordercore migrations")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
}

/// Maximum number of database connections in the pool.
///
/// MaxConnections represents the connection pool size limit. It must be at least 1,
/// enforced by using NonZeroU32 as the underlying type.
///
/// # Examples
///
/// ```ignore
/// use ordercore_postgres::MaxConnections;
/// use std::num::NonZeroU32;
///
/// let small_pool = MaxConnections::new(NonZeroU32::new(5).expect("5 is non-zero"));
/// ```
#[nutype(derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRef, Into))]
pub struct MaxConnections(NonZeroU32);

/// Invalid pool settings read from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{variable} must be a positive integer, got {value:?}")]
    NotPositive {
        variable: &'static str,
        value: String,
    },

    #[error("{variable} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds {
        variable: &'static str,
        value: String,
    },
}

/// Configuration for the PostgresStore connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    /// Maximum number of connections in the pool (default: 10)
    pub max_connections: MaxConnections,
    /// Timeout for acquiring a connection from the pool (default: 30 seconds)
    pub acquire_timeout: Duration,
    /// Idle timeout for connections in the pool (default: 10 minutes)
    pub idle_timeout: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        const DEFAULT_MAX_CONNECTIONS: NonZeroU32 = match NonZeroU32::new(10) {
            Some(v) => v,
            None => unreachable!(),
        };

        Self {
            max_connections: MaxConnections::new(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600), // 10 minutes
        }
    }
}

impl PostgresConfig {
    pub const MAX_CONNECTIONS_VAR: &'static str = "ORDERCORE_MAX_CONNECTIONS";
    pub const ACQUIRE_TIMEOUT_VAR: &'static str = "ORDERCORE_ACQUIRE_TIMEOUT_SECS";
    pub const IDLE_TIMEOUT_VAR: &'static str = "ORDERCORE_IDLE_TIMEOUT_SECS";

    /// Defaults overridden by `ORDERCORE_*` environment variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|variable| env::var(variable).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(Self::MAX_CONNECTIONS_VAR) {
            let parsed = value
                .trim()
                .parse::<NonZeroU32>()
                .map_err(|_| ConfigError::NotPositive {
                    variable: Self::MAX_CONNECTIONS_VAR,
                    value: value.clone(),
                })?;
            config.max_connections = MaxConnections::new(parsed);
        }
        if let Some(value) = lookup(Self::ACQUIRE_TIMEOUT_VAR) {
            config.acquire_timeout = seconds(Self::ACQUIRE_TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = lookup(Self::IDLE_TIMEOUT_VAR) {
            config.idle_timeout = seconds(Self::IDLE_TIMEOUT_VAR, &value)?;
        }

        Ok(config)
    }
}

fn seconds(variable: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidSeconds {
            variable,
            value: value.to_string(),
        })
}

/// PostgreSQL-backed [`OrderStore`].
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgresStore with default configuration.
    pub async fn new<S: Into<String>>(connection_string: S) -> Result<Self, PostgresStoreError> {
        Self::with_config(connection_string, PostgresConfig::default()).await
    }

    /// Create a new PostgresStore with custom configuration.
    pub async fn with_config<S: Into<String>>(
        connection_string: S,
        config: PostgresConfig,
    ) -> Result<Self, PostgresStoreError> {
        let connection_string = connection_string.into();
        let max_connections: NonZeroU32 = config.max_connections.into();
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.get())
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect(&connection_string)
            .await
            .map_err(PostgresStoreError::ConnectionFailed)?;
        Ok(Self { pool })
    }

    /// Create a PostgresStore from an existing connection pool.
    ///
    /// Use this when you need full control over pool configuration or want to
    /// share a pool across multiple components.
    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> Result<(), PostgresStoreError> {
        let _ = query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(PostgresStoreError::PingFailed)?;
        Ok(())
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), PostgresStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(PostgresStoreError::MigrationFailed)
    }
}

impl OrderStore for PostgresStore {
    type Transaction = PostgresTransaction;

    #[instrument(name = "postgres.begin", skip(self))]
    async fn begin(&self) -> Result<Self::Transaction, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|error| map_sqlx_error(error, Operation::BeginTransaction))?;
        Ok(PostgresTransaction::new(tx))
    }
}

/// Translate a driver error into the storage contract's vocabulary.
///
/// 23505 is a unique violation; 40001 (serialization failure) and 40P01
/// (deadlock victim) mean a concurrent transaction won and a retry may succeed.
pub(crate) fn map_sqlx_error(error: sqlx::Error, operation: Operation) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        match db_error.code().as_deref() {
            Some("23505") => {
                warn!(
                    error = %db_error,
                    operation = %operation,
                    "[postgres.unique_violation] uniqueness constraint rejected write"
                );
                return StoreError::UniqueViolation { operation };
            }
            Some("40001" | "40P01") => {
                warn!(
                    error = %db_error,
                    operation = %operation,
                    "[postgres.contention] transaction aborted by a concurrent one"
                );
                return StoreError::Contention { operation };
            }
            _ => {}
        }
    }
    error!(
        error = %error,
        operation = %operation,
        "[postgres.database_error] database operation failed"
    );
    StoreError::StoreFailure { operation }
}
