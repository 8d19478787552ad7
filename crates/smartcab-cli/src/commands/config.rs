//! Configuration management commands

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use smartcab_sim::Config;

const CONFIG_FILE: &str = "smartcab.toml";

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write the default configuration to smartcab.toml
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show().await,
        ConfigCommands::Init { force } => init(Path::new(CONFIG_FILE), force).await,
    }
}

async fn show() -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    match Config::find_config_file() {
        Some(path) => println!("Config file: {}\n", path.display()),
        None => println!("No configuration file found. Using defaults.\n"),
    }

    let config = Config::load()?;
    println!("{}", config.to_toml()?);
    Ok(())
}

async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(path, Config::default().to_toml()?)?;
    println!("Configuration written to: {}", path.display());
    Ok(())
}
