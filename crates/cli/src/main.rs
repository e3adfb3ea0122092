mod avatars_cmd;
mod config;
mod export_cmd;
mod validate_cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rollscribe",
    version,
    about = "rollscribe - export saved Roll20 chat logs as structured JSON"
)]
struct Cli {
    /// Config file (default: ./rollscribe.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a saved chat archive into JSON entries
    Export(export_cmd::ExportArgs),

    /// List speaker/avatar pairs for writing a replacement file
    Avatars(avatars_cmd::AvatarsArgs),

    /// Check an export file against the entry schema
    Validate {
        /// JSON array or JSON Lines file produced by `export`
        file: PathBuf,
    },

    /// Show the effective configuration
    Config {
        /// Write a default rollscribe.toml into the current directory
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long, requires = "init")]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = config::load_config(cli.config.as_deref()).and_then(|(cfg, source)| {
        match cli.command {
            Commands::Export(args) => export_cmd::run(args, &cfg),
            Commands::Avatars(args) => avatars_cmd::run(args, &cfg),
            Commands::Validate { file } => validate_cmd::run(&file),
            Commands::Config { init, force } => {
                if init {
                    let path = config::init_config(std::path::Path::new("."), force)?;
                    println!("Wrote {}", path.display());
                    Ok(())
                } else {
                    config::show_config(&cfg, &source)
                }
            }
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
