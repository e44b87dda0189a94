//! User commands: migrate, list, get, add, rename, delete

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use userdb_core::{User, UserStore};
use uuid::Uuid;

use super::Output;

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// User id (UUID)
    pub id: Uuid,
}

#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Display name
    pub name: String,

    /// Use this id instead of generating one
    #[arg(long)]
    pub id: Option<Uuid>,
}

#[derive(Parser, Debug)]
pub struct RenameArgs {
    /// User id (UUID)
    pub id: Uuid,

    /// New display name
    pub name: String,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// User id (UUID)
    pub id: Uuid,
}

pub async fn run_migrate(store: &dyn UserStore, output: Output) -> Result<()> {
    store.migrate().await.context("Migration failed")?;
    output.emit(json!({ "migrated": true }), || "users table ready".to_string())
}

pub async fn run_list(store: &dyn UserStore, output: Output) -> Result<()> {
    let users = store.get_all().await.context("Failed to list users")?;

    output.emit(serde_json::to_value(&users)?, || {
        if users.is_empty() {
            return "no users".to_string();
        }
        users
            .iter()
            .map(format_user)
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub async fn run_get(store: &dyn UserStore, args: GetArgs, output: Output) -> Result<()> {
    let user = store
        .find_by_id(args.id)
        .await
        .context("Failed to look up user")?
        .with_context(|| format!("user '{}' not found", args.id))?;

    output.emit(serde_json::to_value(&user)?, || format_user(&user))
}

pub async fn run_add(store: &dyn UserStore, args: AddArgs, output: Output) -> Result<()> {
    let mut user = User::with_id(args.id.unwrap_or_else(Uuid::nil), args.name);
    let id = store.save(&mut user).await.context("Failed to add user")?;

    tracing::info!(%id, "user added");
    output.emit(serde_json::to_value(&user)?, || id.to_string())
}

pub async fn run_rename(store: &dyn UserStore, args: RenameArgs, output: Output) -> Result<()> {
    let user = User::with_id(args.id, args.name);
    store.update(&user).await.context("Failed to rename user")?;

    output.emit(serde_json::to_value(&user)?, || format_user(&user))
}

pub async fn run_delete(store: &dyn UserStore, args: DeleteArgs, output: Output) -> Result<()> {
    let user = User::with_id(args.id, String::new());
    let id = store.delete(&user).await.context("Failed to delete user")?;

    output.emit(json!({ "deleted": id }), || format!("deleted {id}"))
}

fn format_user(user: &User) -> String {
    format!("{}\t{}", user.id, user.name)
}
