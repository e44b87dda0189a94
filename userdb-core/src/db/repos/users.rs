//! User repository
//!
//! CRUD over the single `t_users` table:
//! - save: INSERT ... ON CONFLICT DO NOTHING (conflict when nothing inserted)
//! - update/delete: rows affected decide not-found
//! - get_all: no ordering, storage order

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::db::{migrations, DbTransaction};
use crate::error::{DbError, Result};
use crate::models::User;

const RESOURCE: &str = "user";

/// Storage operations for users.
///
/// Implemented by [`UserRepo`]; front ends depend on the trait.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Insert `user`, generating an id first if it is nil.
    async fn save(&self, user: &mut User) -> Result<Uuid>;

    async fn update(&self, user: &User) -> Result<Uuid>;

    async fn delete(&self, user: &User) -> Result<Uuid>;

    async fn migrate(&self) -> Result<()>;
}

/// User repository
#[derive(Debug, Clone)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_by_id_in(&self, tx: &mut DbTransaction, id: Uuid) -> Result<Option<User>> {
        select_one(tx.connection().await?, id).await
    }

    pub async fn get_all_in(&self, tx: &mut DbTransaction) -> Result<Vec<User>> {
        select_all(tx.connection().await?).await
    }

    pub async fn save_in(&self, tx: &mut DbTransaction, user: &mut User) -> Result<Uuid> {
        assign_id(user);
        insert(tx.connection().await?, user).await
    }

    pub async fn update_in(&self, tx: &mut DbTransaction, user: &User) -> Result<Uuid> {
        require_id(user)?;
        update_name(tx.connection().await?, user).await
    }

    pub async fn delete_in(&self, tx: &mut DbTransaction, user: &User) -> Result<Uuid> {
        require_id(user)?;
        delete_row(tx.connection().await?, user.id).await
    }
}

#[async_trait]
impl UserStore for UserRepo {
    async fn get_all(&self) -> Result<Vec<User>> {
        select_all(&self.pool).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        select_one(&self.pool, id).await
    }

    async fn save(&self, user: &mut User) -> Result<Uuid> {
        assign_id(user);
        insert(&self.pool, user).await
    }

    async fn update(&self, user: &User) -> Result<Uuid> {
        require_id(user)?;
        update_name(&self.pool, user).await
    }

    async fn delete(&self, user: &User) -> Result<Uuid> {
        require_id(user)?;
        delete_row(&self.pool, user.id).await
    }

    async fn migrate(&self) -> Result<()> {
        migrations::run(&self.pool).await
    }
}

fn assign_id(user: &mut User) {
    if !user.has_id() {
        user.id = Uuid::new_v4();
    }
}

fn require_id(user: &User) -> Result<()> {
    if user.has_id() {
        Ok(())
    } else {
        Err(DbError::usage("user id is not set"))
    }
}

async fn select_one<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name
        FROM t_users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

async fn select_all<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name
        FROM t_users
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(users)
}

async fn insert<'e, E: PgExecutor<'e>>(executor: E, user: &User) -> Result<Uuid> {
    let done = sqlx::query(
        r#"
        INSERT INTO t_users (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .execute(executor)
    .await?;

    if done.rows_affected() == 0 {
        return Err(DbError::conflict(RESOURCE, user.id));
    }

    tracing::debug!(id = %user.id, "user saved");
    Ok(user.id)
}

async fn update_name<'e, E: PgExecutor<'e>>(executor: E, user: &User) -> Result<Uuid> {
    let done = sqlx::query(
        r#"
        UPDATE t_users
        SET name = $2
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .execute(executor)
    .await?;

    if done.rows_affected() == 0 {
        return Err(DbError::not_found(RESOURCE, user.id));
    }

    tracing::debug!(id = %user.id, "user updated");
    Ok(user.id)
}

async fn delete_row<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Uuid> {
    let done = sqlx::query(
        r#"
        DELETE FROM t_users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    if done.rows_affected() == 0 {
        return Err(DbError::not_found(RESOURCE, id));
    }

    tracing::debug!(%id, "user deleted");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_repo() -> UserRepo {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/userdb_unreachable")
            .expect("lazy pool");
        UserRepo::new(pool)
    }

    #[test]
    fn assign_id_only_when_unset() {
        let mut user = User::with_id(Uuid::nil(), "Alice");
        assign_id(&mut user);
        assert!(user.has_id());

        let id = Uuid::new_v4();
        let mut user = User::with_id(id, "Bob");
        assign_id(&mut user);
        assert_eq!(user.id, id);
    }

    // Missing ids are rejected before any query, so no server is needed.
    #[tokio::test]
    async fn update_requires_id() {
        let repo = lazy_repo();
        let err = repo
            .update(&User::with_id(Uuid::nil(), "x"))
            .await
            .unwrap_err();
        assert!(err.is_usage());
    }

    #[tokio::test]
    async fn delete_requires_id() {
        let repo = lazy_repo();
        let err = repo
            .delete(&User::with_id(Uuid::nil(), "x"))
            .await
            .unwrap_err();
        assert!(err.is_usage());
    }

    #[tokio::test]
    async fn finalized_transaction_rejects_repo_calls() {
        let repo = lazy_repo();
        let mut tx = DbTransaction::deferred(repo.pool().clone());
        tx.rollback().await.unwrap();

        let err = repo
            .save_in(&mut tx, &mut User::new("Carol"))
            .await
            .unwrap_err();
        assert!(err.is_usage());

        let err = repo.get_all_in(&mut tx).await.unwrap_err();
        assert!(err.is_usage());
    }
}
