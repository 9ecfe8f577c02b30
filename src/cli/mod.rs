use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app;
use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::delivery::ScriptDelivery;
use crate::storage::RosterStore;

pub mod commands;

use self::commands::{SendArgs, ShowArgs};

const LOG_FILE: &str = "rostertui.log";

#[derive(Parser, Debug)]
#[command(
    name = "rostertui",
    version,
    about = "Terminal roster messenger: pick contacts, compose, send"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over ROSTERTUI_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over ROSTERTUI_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Send one message without the TUI: `[to] NAMES : MESSAGE`
    Send(SendArgs),
    /// Print every roster with its contact count
    Lists,
    /// Print one roster as a table
    Show(ShowArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let command = cli.command.unwrap_or(Commands::Tui);

    // The TUI owns the screen, so its logs go to a file instead of stderr.
    let log_file = matches!(command, Commands::Tui).then(|| paths.log_dir.join(LOG_FILE));
    init_tracing(&cli.log_level, log_file.as_deref())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;

    let store = RosterStore::new(config.lists.dir.clone(), config.lists.aliases.clone());
    let delivery = ScriptDelivery::new(
        config.delivery.program.clone(),
        config.delivery.script.clone(),
    );
    tracing::debug!(lists = %config.lists.dir.display(), ?command, "starting");

    match command {
        Commands::Tui => app::run_tui(config, store, Box::new(delivery)),
        Commands::Send(args) => commands::send(&config, &store, &delivery, args),
        Commands::Lists => commands::lists(&store),
        Commands::Show(args) => commands::show(&store, args),
    }
}

fn init_tracing(level: &str, file: Option<&Path>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            None => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
        Ok(())
    })
    .map(|_| ())
}
