//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Pool-backed methods for standalone calls
//! - `*_in` variants that run through a [`DbTransaction`](super::DbTransaction)
//! - Conflicts and missing rows detected from rows affected

pub mod users;

pub use users::{UserRepo, UserStore};
