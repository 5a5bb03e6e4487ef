//! tabsync CLI - Save, restore and sync browser window sessions
//!
//! Sessions live in a local `SQLite` store and sync to a single JSON document
//! on Google Drive or in a local folder.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;
mod remote_backend;

use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::CliContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::export::{run_export, run_import};
use crate::commands::list::{run_list, run_show};
use crate::commands::restore::run_restore;
use crate::commands::save::run_save;
use crate::commands::sync::{run_daemon, run_sync};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "tabsync=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let context = CliContext::resolve(cli.db_path, cli.profile)?;
    match cli.command {
        Commands::Save { name } => run_save(&name, &context).await?,
        Commands::List { json } => run_list(json, &context).await?,
        Commands::Show { id, json } => run_show(&id, json, &context).await?,
        Commands::Restore { id } => run_restore(&id, &context).await?,
        Commands::Delete { id } => run_delete(&id, &context).await?,
        Commands::Export { format, output } => {
            run_export(format, output.as_deref(), &context).await?;
        }
        Commands::Import { path, format } => run_import(&path, format, &context).await?,
        Commands::Sync => run_sync(&context).await?,
        Commands::Daemon { interval } => run_daemon(interval, &context).await?,
        Commands::Config { command } => run_config(command, &context).await?,
        Commands::Auth { command } => run_auth(command, &context)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests;
