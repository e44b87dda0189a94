//! Commands bound to a transaction wrapper's connection

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Encode, FromRow, PgConnection, Postgres, Type};

use crate::error::Result;

/// A single SQL statement bound to a connection.
///
/// Created by [`DbTransaction::create_command`](super::DbTransaction::create_command),
/// so it runs inside the wrapper's native transaction when one is active.
/// Parameters are positional (`$1`, `$2`, ...) and bound in order.
pub struct Command<'t> {
    conn: &'t mut PgConnection,
    query: Query<'t, Postgres, PgArguments>,
}

impl<'t> Command<'t> {
    pub(crate) fn new(conn: &'t mut PgConnection, sql: &'t str) -> Self {
        Self {
            conn,
            query: sqlx::query(sql),
        }
    }

    /// Bind the next positional parameter.
    pub fn bind<T>(mut self, value: T) -> Self
    where
        T: 't + Send + Encode<'t, Postgres> + Type<Postgres>,
    {
        self.query = self.query.bind(value);
        self
    }

    /// Execute and return the number of affected rows.
    pub async fn execute(self) -> Result<u64> {
        let Self { conn, query } = self;
        let done = query.execute(conn).await?;
        Ok(done.rows_affected())
    }

    pub async fn fetch_all(self) -> Result<Vec<PgRow>> {
        let Self { conn, query } = self;
        Ok(query.fetch_all(conn).await?)
    }

    pub async fn fetch_optional(self) -> Result<Option<PgRow>> {
        let Self { conn, query } = self;
        Ok(query.fetch_optional(conn).await?)
    }

    pub async fn fetch_one(self) -> Result<PgRow> {
        let Self { conn, query } = self;
        Ok(query.fetch_one(conn).await?)
    }

    /// Fetch all rows mapped through `FromRow`.
    pub async fn fetch_all_as<T>(self) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        let rows = self.fetch_all().await?;
        let items = rows
            .iter()
            .map(T::from_row)
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;
        Ok(items)
    }

    pub async fn fetch_optional_as<T>(self) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow>,
    {
        match self.fetch_optional().await? {
            Some(row) => Ok(Some(T::from_row(&row)?)),
            None => Ok(None),
        }
    }
}
