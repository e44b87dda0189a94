//! Connection source
//!
//! Builds one sqlx `PgPool` on first use and hands out connections and
//! transaction wrappers from it.

use futures::future::BoxFuture;
use once_cell::sync::OnceCell;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use tracing::debug;

use super::transaction::DbTransaction;
use crate::config::DbConfig;
use crate::error::Result;

/// Lazily pooled PostgreSQL data source.
pub struct PgDataSource {
    config: DbConfig,
    pool: OnceCell<PgPool>,
}

impl PgDataSource {
    /// Validate the configuration. No connection is opened here.
    pub fn new(config: DbConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pool: OnceCell::new(),
        })
    }

    /// Shorthand for [`PgDataSource::new`] with default pool settings.
    pub fn from_url(database_url: impl Into<String>) -> Result<Self> {
        Self::new(DbConfig::new(database_url))
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// The shared pool, built on the first call and cached afterwards.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn pool(&self) -> Result<&PgPool> {
        self.pool.get_or_try_init(|| self.build_pool())
    }

    fn build_pool(&self) -> Result<PgPool> {
        let options = self.config.connect_options()?;
        debug!(
            max_connections = self.config.max_connections,
            acquire_timeout_secs = self.config.acquire_timeout_secs,
            "building connection pool"
        );

        Ok(PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(self.config.acquire_timeout())
            .connect_lazy_with(options))
    }

    /// Acquire an open connection from the pool.
    pub async fn create_connection(&self) -> Result<PoolConnection<Postgres>> {
        Ok(self.pool()?.acquire().await?)
    }

    /// Wrap a freshly opened connection. No native transaction is started;
    /// call [`DbTransaction::begin_transaction`] when one is needed.
    pub async fn create_transaction(&self) -> Result<DbTransaction> {
        let pool = self.pool()?;
        let conn = pool.acquire().await?;
        Ok(DbTransaction::new(pool.clone(), conn))
    }

    /// Wrapper that acquires its connection on first use.
    pub fn deferred_transaction(&self) -> Result<DbTransaction> {
        Ok(DbTransaction::deferred(self.pool()?.clone()))
    }

    /// Open a connection and start a native transaction on it.
    pub async fn begin_transaction(&self) -> Result<DbTransaction> {
        let mut tx = self.create_transaction().await?;
        if let Err(err) = tx.begin_transaction().await {
            tx.close().await.ok();
            return Err(err);
        }
        Ok(tx)
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`. The wrapper is closed on every path,
    /// which rolls back when `f` failed or left the transaction active.
    ///
    /// ```ignore
    /// let repo = UserRepo::new(source.pool()?.clone());
    /// let id = source
    ///     .with_transaction(move |tx| {
    ///         Box::pin(async move { repo.save_in(tx, &mut User::new("Alice")).await })
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t mut DbTransaction) -> BoxFuture<'t, Result<T>>,
    {
        let mut tx = self.begin_transaction().await?;

        let outcome = match f(&mut tx).await {
            Ok(value) => tx.commit().await.map(|()| value),
            Err(err) => Err(err),
        };
        let closed = tx.close().await;

        let value = outcome?;
        closed?;
        Ok(value)
    }
}

impl std::fmt::Debug for PgDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDataSource")
            .field("max_connections", &self.config.max_connections)
            .field("pool_built", &self.pool.get().is_some())
            .finish()
    }
}
