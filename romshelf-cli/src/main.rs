//! romshelf CLI
//!
//! Command-line interface for cataloging ROM files and generating the
//! native launcher's cache tables.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "romshelf")]
#[command(about = "Catalog ROM files and build launcher cache tables", long_about = None)]
struct Cli {
    /// Settings file (defaults to ~/.config/romshelf/settings.toml)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Override the ROM root from settings
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the catalog (incremental unless --reset)
    Rebuild {
        /// Discard the previous catalog and re-resolve everything
        #[arg(long)]
        reset: bool,

        /// Also rebuild the launcher cache tables afterwards
        #[arg(long)]
        cache: bool,
    },

    /// Rebuild the launcher cache tables from the persisted catalog
    Cache,

    /// Evaluate collection rules and materialize shortcut groupings
    Collections,

    /// Show catalog statistics
    Stats,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let mut settings = romshelf_lib::settings::load(cli.settings.as_deref());
    if let Some(root) = cli.root {
        settings.rom_root = root;
    }

    match cli.command {
        Commands::Rebuild { reset, cache } => commands::rebuild::run(&settings, reset, cache),
        Commands::Cache => commands::cache::run(&settings),
        Commands::Collections => commands::collections::run(&settings),
        Commands::Stats => commands::stats::run(&settings),
    }
}
