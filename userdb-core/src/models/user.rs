//! User entity

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user row in `t_users`.
///
/// The nil UUID marks an identifier that has not been assigned yet;
/// [`UserRepo::save`](crate::db::UserRepo::save) fills it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
}

impl User {
    /// New user with a freshly generated identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Whether an identifier has been assigned.
    pub fn has_id(&self) -> bool {
        !self.id.is_nil()
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new("")
    }
}
