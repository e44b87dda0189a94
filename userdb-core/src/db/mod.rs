//! Database layer - connection source, transactions and repositories
//!
//! # Design Principles
//!
//! - One lazily built pool per data source; no global connection string
//! - Transaction state is explicit (Active / Committed / RolledBack)
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Every value is a bound parameter

pub mod command;
pub mod migrations;
pub mod repos;
pub mod source;
pub mod transaction;

pub use command::Command;
pub use repos::*;
pub use source::PgDataSource;
pub use transaction::{DbTransaction, Isolation, TxState};
