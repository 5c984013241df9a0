// SPDX-License-Identifier: AGPL-3.0-or-later
//! dbxfs CLI
//!
//! Use a Dropbox account like a filesystem.

mod commands;
mod settings;

use clap::{Parser, Subcommand};
use dbxfs_core::ErrorPolicy;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dbxfs")]
#[command(author, version, about = "dbxfs - Dropbox as a filesystem", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Access token (overrides DROPBOX_TOKEN and the config file)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Config file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List folder contents
    #[command(alias = "dir")]
    Ls {
        /// Folder to list (defaults to the root)
        #[arg(default_value = "/")]
        path: String,

        /// Long format with details
        #[arg(short, long)]
        long: bool,

        /// Only direct children
        #[arg(long)]
        flat: bool,

        /// Human-readable sizes
        #[arg(short = 'H', long)]
        human: bool,
    },

    /// Show file or folder information
    Stat {
        path: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create folders
    Mkdir {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Remove files or folders
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Copy files or folders; a trailing '/' marks a folder
    Cp {
        /// Source path(s) followed by the destination
        #[arg(required = true, num_args = 2..)]
        paths: Vec<String>,

        /// Required to copy folders
        #[arg(short, long)]
        recursive: bool,

        /// raise or ignore (default: ignore when recursive, else raise)
        #[arg(long)]
        on_error: Option<ErrorPolicy>,
    },

    /// Print a remote file
    Cat { path: String },

    /// Upload a local file
    Put {
        local: PathBuf,
        remote: String,

        /// Add alongside an existing file instead of overwriting
        #[arg(short, long)]
        append: bool,
    },

    /// Download a remote file
    Get { remote: String, local: PathBuf },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let fs = match settings::resolve_config(cli.token.clone(), cli.config.clone())
        .and_then(dbxfs_providers::dropbox_fs)
    {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Ls { path, long, flat, human } => {
            commands::ls(&fs, &path, long, !flat, human).await
        }
        Commands::Stat { path, json } => commands::stat(&fs, &path, json).await,
        Commands::Mkdir { paths } => commands::mkdir(&fs, &paths).await,
        Commands::Rm { paths } => commands::rm(&fs, &paths).await,
        Commands::Cp { mut paths, recursive, on_error } => {
            // clap guarantees at least two
            let dest = paths.pop().unwrap_or_default();
            commands::cp(&fs, paths, &dest, recursive, on_error).await
        }
        Commands::Cat { path } => commands::cat(&fs, &path).await,
        Commands::Put { local, remote, append } => {
            commands::put(&fs, &local, &remote, append).await
        }
        Commands::Get { remote, local } => commands::get(&fs, &remote, &local).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_precondition() {
                eprintln!("hint: folders need `dbxfs cp -r`, with a trailing '/' on both paths");
            }
            ExitCode::FAILURE
        }
    }
}
