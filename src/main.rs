//! # hn-ranker CLI (`hnr`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hnr serve` | Start the HTTP server (JSON API + ranking form) |
//! | `hnr rank [BIO]` | Rank the top stories against a bio |
//! | `hnr stories` | Print the current top stories, unranked |
//! | `hnr client [BIO]` | Rank through a running server |
//! | `hnr completions <shell>` | Print a shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! hnr rank "Backend engineer, into databases and Rust" --limit 20
//! echo "I like woodworking and home automation" | hnr rank
//! hnr serve --config ./config/hnr.toml
//! hnr client --server http://127.0.0.1:5000 "compilers"
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use hn_ranker::{commands, config, server};

const DEFAULT_CONFIG: &str = "./config/hnr.toml";

/// Rank Hacker News top stories by similarity to your bio.
#[derive(Parser)]
#[command(
    name = "hnr",
    about = "Rank Hacker News top stories by semantic similarity to a bio",
    version
)]
struct Cli {
    /// Path to configuration file (TOML) [default: ./config/hnr.toml].
    ///
    /// Without this flag a missing default file means built-in defaults; a
    /// file given explicitly must exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Serves `POST /ranked_stories`, `GET /stories`, `GET /health` and the
    /// interactive form at `/`, bound to `[server].bind`.
    Serve,

    /// Rank the top stories against a bio.
    ///
    /// Without BIO the bio is read from stdin (prompting on a terminal).
    Rank {
        /// Free-text bio describing your interests.
        bio: Option<String>,

        /// Only print the first N stories.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the current top stories in feed order.
    Stories {
        /// Only print the first N stories.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Rank through a running `hnr serve` instance.
    Client {
        /// Free-text bio describing your interests.
        bio: Option<String>,

        /// Base URL of the server.
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        server: String,

        /// Only print the first N stories.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a shell completion script.
    Completions {
        shell: Shell,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<config::Config> {
    match path {
        Some(path) => config::load_config(path),
        None => config::load_config_or_default(Path::new(DEFAULT_CONFIG)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    // Commands that don't require config
    match &cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "hnr", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Client { bio, server, limit } => {
            commands::run_client(server, bio.clone(), *limit).await?;
            return Ok(());
        }
        _ => {}
    }

    let cfg = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Rank { bio, limit } => {
            commands::run_rank(&cfg, bio, limit).await?;
        }
        Commands::Stories { limit } => {
            commands::run_stories(&cfg, limit).await?;
        }
        Commands::Completions { .. } | Commands::Client { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
