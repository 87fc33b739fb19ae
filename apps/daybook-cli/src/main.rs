//! Daybook CLI - command line interface for the Daybook calendar

use anyhow::Context;
use clap::Parser;
use daybook_cli::{execute, Cli, Session};
use daybook_core::{init_tracing, DaybookConfig, SqliteEventStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = DaybookConfig::load(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        config.database_path.clone_from(database);
    }
    if cli.verbose {
        config.log_level = "debug".to_string();
    }
    init_tracing(&config)?;

    let locale = config.chrono_locale()?;
    let store = SqliteEventStore::new(&config.database_path)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;

    let session = Session {
        store: Arc::new(store),
        locale,
        json: cli.json,
    };
    execute(cli.command, &session, &mut std::io::stdout()).await
}
