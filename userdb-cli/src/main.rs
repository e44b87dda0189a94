//! userdb CLI - manage the users table from the command line
//!
//! Thin front end over `userdb-core`: builds a data source from
//! `--database-url`, `--config` or `DATABASE_URL`, then runs one command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use userdb_core::{DbConfig, PgDataSource, UserRepo};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "userdb",
    author,
    version,
    about = "Create, inspect and modify users stored in PostgreSQL"
)]
struct Cli {
    /// PostgreSQL connection string (overrides --config; DATABASE_URL is
    /// read only when neither is given)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// TOML file with database settings
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the users table if it does not exist
    Migrate,
    /// List all users
    List,
    /// Show one user by id
    Get(commands::users::GetArgs),
    /// Add a user
    Add(commands::users::AddArgs),
    /// Change a user's name
    Rename(commands::users::RenameArgs),
    /// Delete a user by id
    Delete(commands::users::DeleteArgs),
}

/// Resolve settings: `--database-url` beats the config file, and the
/// `DATABASE_URL` environment value is consulted only without `--config`.
fn resolve_config(cli: &Cli, env_url: Option<String>) -> Result<DbConfig> {
    let mut config = match &cli.config {
        Some(path) => DbConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let url = cli.database_url.clone().or(env_url).context(
                "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or --config",
            )?;
            return Ok(DbConfig::new(url));
        }
    };

    if let Some(url) = &cli.database_url {
        config.database_url = url.clone();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;

    let config = resolve_config(&cli, std::env::var("DATABASE_URL").ok())?;
    let source = PgDataSource::new(config).context("Invalid database configuration")?;
    let repo = UserRepo::new(source.pool()?.clone());

    let output = commands::Output { json: cli.json };

    match cli.command {
        Commands::Migrate => commands::users::run_migrate(&repo, output).await,
        Commands::List => commands::users::run_list(&repo, output).await,
        Commands::Get(args) => commands::users::run_get(&repo, args, output).await,
        Commands::Add(args) => commands::users::run_add(&repo, args, output).await,
        Commands::Rename(args) => commands::users::run_rename(&repo, args, output).await,
        Commands::Delete(args) => commands::users::run_delete(&repo, args, output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(url: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_url = \"{url}\"").unwrap();
        file
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("userdb").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn env_url_used_without_config() {
        let cli = parse(&["list"]);
        let config = resolve_config(&cli, Some("postgres://env/db".into())).unwrap();
        assert_eq!(config.database_url, "postgres://env/db");
    }

    #[test]
    fn flag_beats_env_url() {
        let cli = parse(&["--database-url", "postgres://flag/db", "list"]);
        let config = resolve_config(&cli, Some("postgres://env/db".into())).unwrap();
        assert_eq!(config.database_url, "postgres://flag/db");
    }

    #[test]
    fn config_file_beats_env_url() {
        let file = config_file("postgres://file/db");
        let path = file.path().to_str().unwrap();
        let cli = parse(&["--config", path, "list"]);

        let config = resolve_config(&cli, Some("postgres://env/db".into())).unwrap();
        assert_eq!(config.database_url, "postgres://file/db");
    }

    #[test]
    fn flag_beats_config_file() {
        let file = config_file("postgres://file/db");
        let path = file.path().to_str().unwrap();
        let cli = parse(&["--config", path, "--database-url", "postgres://flag/db", "list"]);

        let config = resolve_config(&cli, None).unwrap();
        assert_eq!(config.database_url, "postgres://flag/db");
    }

    #[test]
    fn missing_url_is_reported() {
        let cli = parse(&["list"]);
        let err = resolve_config(&cli, None).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL not set"));
    }
}
