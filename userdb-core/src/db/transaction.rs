//! Transaction wrapper over one pooled connection
//!
//! The wrapper owns at most one connection and tracks at most one native
//! transaction on it. State is explicit:
//!
//! ```text
//! Active ──commit──▶ Committed
//!   │
//!   └──rollback / close──▶ RolledBack
//! ```
//!
//! Both terminal states reject every further command.

use sqlx::pool::PoolConnection;
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use tracing::{debug, warn};

use super::command::Command;
use crate::error::{DbError, Result};

/// Lifecycle state of a [`DbTransaction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Active,
    Committed,
    RolledBack,
}

impl TxState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Isolation level of a native transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    /// Server default (`READ COMMITTED` unless reconfigured)
    Default,
    ReadCommitted,
}

impl Isolation {
    fn begin_statement(self) -> &'static str {
        match self {
            Self::Default => "BEGIN",
            Self::ReadCommitted => "BEGIN ISOLATION LEVEL READ COMMITTED",
        }
    }
}

/// One connection plus an optional native transaction.
///
/// Call [`close`](Self::close) when done; it rolls back anything still
/// active and releases the connection. Dropping an unclosed wrapper with
/// an open native transaction discards the connection instead of
/// returning it to the pool.
pub struct DbTransaction {
    pool: Option<PgPool>,
    conn: Option<PoolConnection<Postgres>>,
    native: Option<Isolation>,
    state: TxState,
}

impl DbTransaction {
    /// Wrap an already acquired connection from `pool`.
    pub fn new(pool: PgPool, conn: PoolConnection<Postgres>) -> Self {
        Self {
            pool: Some(pool),
            conn: Some(conn),
            native: None,
            state: TxState::Active,
        }
    }

    /// Wrapper that acquires its connection from `pool` on first use.
    pub fn deferred(pool: PgPool) -> Self {
        Self {
            pool: Some(pool),
            conn: None,
            native: None,
            state: TxState::Active,
        }
    }

    /// Wrap an externally supplied connection, optionally already inside a
    /// native transaction started by the caller.
    ///
    /// The wrapper takes over releasing the connection. Without a pool it
    /// cannot reacquire one after [`close`](Self::close).
    pub fn from_connection(conn: PoolConnection<Postgres>, native: Option<Isolation>) -> Self {
        Self {
            pool: None,
            conn: Some(conn),
            native,
            state: TxState::Active,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    pub fn is_committed(&self) -> bool {
        self.state == TxState::Committed
    }

    pub fn is_rolled_back(&self) -> bool {
        self.state == TxState::RolledBack
    }

    /// Whether a native transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.native.is_some()
    }

    /// Isolation level of the open native transaction, if any.
    pub fn isolation(&self) -> Option<Isolation> {
        self.native
    }

    /// Whether a connection is currently held.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Start a native transaction at the server's default isolation.
    pub async fn begin_transaction(&mut self) -> Result<()> {
        self.begin_with(Isolation::Default).await
    }

    /// Start a native `READ COMMITTED` transaction.
    pub async fn begin_read_transaction(&mut self) -> Result<()> {
        self.begin_with(Isolation::ReadCommitted).await
    }

    pub async fn begin_with(&mut self, isolation: Isolation) -> Result<()> {
        self.ensure_usable()?;
        if let Some(current) = self.native {
            return Err(DbError::usage(format!(
                "a {current:?} transaction is already in progress"
            )));
        }

        // Marked open before BEGIN is sent, so a future dropped mid-flight
        // still leaves close() and Drop treating the transaction as open.
        // ROLLBACK outside a transaction only warns.
        self.ensure_open().await?;
        self.native = Some(isolation);

        let conn = self.ensure_open().await?;
        let outcome = (&mut **conn).execute(isolation.begin_statement()).await;
        if let Err(err) = outcome {
            self.native = None;
            return Err(err.into());
        }

        debug!(?isolation, "transaction started");
        Ok(())
    }

    /// Commit the native transaction (if any) and mark the wrapper committed.
    ///
    /// Committing twice is harmless; committing after a rollback is not.
    pub async fn commit(&mut self) -> Result<()> {
        match self.state {
            TxState::Committed => return Ok(()),
            TxState::RolledBack => {
                return Err(DbError::usage(
                    "cannot commit: transaction was already rolled back",
                ))
            }
            TxState::Active => {}
        }

        if self.native.is_some() {
            let conn = self
                .conn
                .as_mut()
                .ok_or_else(|| DbError::usage("connection handle is absent"))?;
            (&mut **conn).execute("COMMIT").await?;
            self.native = None;
            debug!("transaction committed");
        }

        self.state = TxState::Committed;
        Ok(())
    }

    /// Roll back the native transaction (if any) and mark the wrapper rolled back.
    ///
    /// No-op on a wrapper that is already committed or rolled back.
    pub async fn rollback(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Ok(());
        }

        self.state = TxState::RolledBack;

        if self.native.take().is_some() {
            if let Some(conn) = self.conn.as_mut() {
                if let Err(err) = (&mut **conn).execute("ROLLBACK").await {
                    // Server-side state is unknown; never hand this connection out again.
                    conn.close_on_drop();
                    return Err(err.into());
                }
            }
            debug!("transaction rolled back");
        }

        Ok(())
    }

    /// Create a command bound to this wrapper's connection and transaction.
    pub async fn create_command<'t>(&'t mut self, sql: &'t str) -> Result<Command<'t>> {
        let conn = self.connection().await?;
        Ok(Command::new(conn, sql))
    }

    /// The underlying connection, for use as an sqlx executor.
    ///
    /// Subject to the same checks as [`create_command`](Self::create_command).
    pub async fn connection(&mut self) -> Result<&mut PgConnection> {
        self.ensure_usable()?;
        let conn = self.ensure_open().await?;
        Ok(&mut **conn)
    }

    /// Roll back anything still active and release the connection.
    ///
    /// Safe to call more than once. The connection is released even if the
    /// implicit rollback fails.
    pub async fn close(&mut self) -> Result<()> {
        if self.conn.is_none() {
            return Ok(());
        }

        let outcome = if self.state == TxState::Active {
            if self.native.is_some() {
                warn!("closing transaction wrapper with an open transaction, rolling back");
            }
            self.rollback().await
        } else {
            Ok(())
        };

        // Dropping a PoolConnection returns it to the pool.
        self.conn = None;
        debug!(state = ?self.state, "transaction wrapper closed");
        outcome
    }

    fn ensure_usable(&self) -> Result<()> {
        match self.state {
            TxState::Active => Ok(()),
            TxState::Committed => Err(DbError::usage(
                "transaction was already committed and is no longer usable",
            )),
            TxState::RolledBack => Err(DbError::usage(
                "transaction was already rolled back and is no longer usable",
            )),
        }
    }

    async fn ensure_open(&mut self) -> Result<&mut PoolConnection<Postgres>> {
        if self.conn.is_none() {
            let pool = self
                .pool
                .as_ref()
                .ok_or_else(|| DbError::usage("connection handle is absent"))?;
            debug!("acquiring connection for transaction wrapper");
            self.conn = Some(pool.acquire().await?);
        }

        self.conn
            .as_mut()
            .ok_or_else(|| DbError::usage("connection handle is absent"))
    }
}

impl Drop for DbTransaction {
    fn drop(&mut self) {
        if self.native.is_none() {
            return;
        }
        if let Some(conn) = self.conn.as_mut() {
            warn!("transaction wrapper dropped with an open transaction, discarding connection");
            conn.close_on_drop();
        }
    }
}

impl std::fmt::Debug for DbTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbTransaction")
            .field("state", &self.state)
            .field("native", &self.native)
            .field("open", &self.conn.is_some())
            .finish()
    }
}
