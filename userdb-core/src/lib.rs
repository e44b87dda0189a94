//! userdb-core: PostgreSQL data access for users
//!
//! A connection source that lazily builds one pool, a transaction wrapper
//! with an explicit Active/Committed/RolledBack state, and a repository
//! issuing literal parameterized SQL against the `t_users` table.

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::DbConfig;
pub use db::{Command, DbTransaction, Isolation, PgDataSource, TxState, UserRepo, UserStore};
pub use error::{DbError, Result};
pub use models::User;
