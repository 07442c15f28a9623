mod cli;
mod commands;
mod config;

use clap::Parser;
use catnav_store::ContentStore;
use tracing_subscriber::EnvFilter;

use crate::cli::Commands;
use crate::commands::{
    handle_cat_command, handle_config_command, handle_icons_command, handle_pull_command,
    handle_push_command, handle_show_command, handle_upload_command, handle_verify_command,
};
use crate::config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG wins over the verbosity flags
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::get_config_path);
    // Config commands work on the file itself, so a broken file can still be reset
    let command = match cli.command {
        Commands::Config { command } => {
            return handle_config_command(command, &config_path, cli.dry_run).await;
        }
        command => command,
    };

    let config = Config::load(&config_path).await?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    let store = ContentStore::from_env().with_settings(config.store.clone());

    match command {
        Commands::Verify { json } => {
            handle_verify_command(&store, json).await?;
        }
        Commands::Show { fallback, json } => {
            handle_show_command(&store, fallback, json).await?;
        }
        Commands::Pull { output } => {
            handle_pull_command(&store, &output).await?;
        }
        Commands::Push { input } => {
            handle_push_command(&store, &input, cli.dry_run).await?;
        }
        Commands::Cat { path, binary } => {
            handle_cat_command(&store, &path, binary).await?;
        }
        Commands::Upload {
            local,
            remote,
            message,
        } => {
            handle_upload_command(&store, &local, &remote, message, cli.dry_run).await?;
        }
        Commands::Icons {
            out,
            delay_ms,
            fallback,
        } => {
            handle_icons_command(&store, &config.icons, out, delay_ms, fallback).await?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}
