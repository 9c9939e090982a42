//! TileKit CLI - configure and exercise tile delegate pipelines.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilekit::logging::{default_log_dir, default_log_file, init_logging};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "tilekit")]
#[command(version, about = "Configure and exercise tiled imagery delegate pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered delegate types in resolution order
    Delegates,

    /// Load a layer file and print its effective delegate pipeline
    Check {
        /// Layer INI file
        config: PathBuf,
    },

    /// Run a chain of image transformers over a local image
    Transform {
        /// Input image
        #[arg(long)]
        input: PathBuf,

        /// Output PNG
        #[arg(long)]
        output: PathBuf,

        /// Delegate definition, repeatable, applied in order
        #[arg(long = "delegate", required = true)]
        delegates: Vec<String>,
    },

    /// Fetch one tile of a layer through retrieval, decode, and transform
    Fetch {
        /// Layer INI file
        config: PathBuf,

        /// Level number
        #[arg(long)]
        level: u32,

        /// Row, counted from the south
        #[arg(long)]
        row: u32,

        /// Column, counted from the west
        #[arg(long)]
        col: u32,

        /// Output PNG
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Delegates => commands::delegates::run(),
        Commands::Check { config } => commands::check::run(&config),
        Commands::Transform {
            input,
            output,
            delegates,
        } => commands::transform::run(&input, &output, &delegates),
        Commands::Fetch {
            config,
            level,
            row,
            col,
            output,
        } => {
            let _guard = init_logging(default_log_dir(), default_log_file()).map_err(CliError::LoggingInit)?;
            commands::fetch::run(commands::fetch::FetchArgs {
                config: &config,
                level,
                row,
                col,
                output: &output,
            })
        }
    }
}
