//! Schema setup for the users table

use sqlx::PgExecutor;

use crate::error::Result;

/// Create `t_users` if it does not exist yet.
///
/// Idempotent; safe to run on every start. `gen_random_uuid()` is built in
/// from PostgreSQL 13 onwards.
pub async fn run<'e, E>(executor: E) -> Result<()>
where
    E: PgExecutor<'e>,
{
    tracing::info!("Running users migration...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS t_users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(executor)
    .await?;

    tracing::info!("Users migration complete");
    Ok(())
}
