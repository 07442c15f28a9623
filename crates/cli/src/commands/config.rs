use std::io::{self, BufRead, Write};
use std::path::Path;

use eyre::Result;

use crate::cli::ConfigCommands;
use crate::config::Config;

/// `reset` never reads the current file, so it also repairs one that no longer parses.
pub async fn handle_config_command(cmd: ConfigCommands, config_path: &Path, dry_run: bool) -> Result<()> {
    match cmd {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(config_path).await?;
            config.set_value(&key, &value)?;
            persist(&config, config_path, dry_run, &format!("{} = {}", key, value)).await
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(config_path).await?;
            println!("{}: {}", key, config.get_value(&key)?);
            Ok(())
        }
        ConfigCommands::Show => {
            let config = Config::load(config_path).await?;
            println!("{}\n\n📁 {}", config.show_all(), config_path.display());
            Ok(())
        }
        ConfigCommands::Reset { force } => {
            if !force && !dry_run && !confirm(io::stdin().lock(), "Reset all configuration to defaults?")? {
                println!("❌ Cancelled");
                return Ok(());
            }
            persist(&Config::default(), config_path, dry_run, "defaults restored").await
        }
    }
}

async fn persist(config: &Config, config_path: &Path, dry_run: bool, change: &str) -> Result<()> {
    if dry_run {
        println!("Would update {}: {}", config_path.display(), change);
        return Ok(());
    }

    config.save(config_path).await?;
    tracing::info!(path = %config_path.display(), change, "configuration saved");
    println!("✅ {}", change);
    Ok(())
}

fn confirm(mut input: impl BufRead, question: &str) -> Result<bool> {
    print!("{} (y/N): ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y") || answer.trim().eq_ignore_ascii_case("yes"))
}
