//! Gilt CLI - a GIT layering command line tool.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "gilt")]
#[command(about = "A GIT layering command line tool")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand. Set flags win over the Giltfile.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable or disable debug mode
    #[arg(short, long, global = true, env = "GILT_DEBUG")]
    pub debug: bool,

    /// Path to config file
    #[arg(
        short = 'f',
        long,
        global = true,
        env = "GILT_GILTFILE",
        default_value = gilt_config::DEFAULT_GILT_FILE
    )]
    pub gilt_file: PathBuf,

    /// Path to Gilt's clone dir [default: ~/.gilt/clone]
    #[arg(short = 'c', long, global = true, env = "GILT_GILTDIR")]
    pub gilt_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Gilt with a Giltfile
    Init,

    /// Install gilt dependencies
    Overlay {
        /// Fetch clones concurrently
        #[arg(long)]
        parallel: bool,

        /// Skip post-overlay commands
        #[arg(long)]
        skip_commands: bool,
    },

    /// Display the version of tool
    Version,

    /// Work with the documentation site
    Docs {
        #[command(subcommand)]
        command: DocsCommands,
    },
}

#[derive(Subcommand)]
enum DocsCommands {
    /// Check navbar links and page navigation against the pages
    Check {
        /// Path to the site manifest
        #[arg(long, default_value = "docs/site.yaml")]
        site: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if wants_debug(&cli) { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init => commands::init::run(&cli.global.gilt_file),
        Commands::Overlay {
            parallel,
            skip_commands,
        } => commands::overlay::run(&cli.global, parallel, skip_commands),
        Commands::Version => commands::version::run(),
        Commands::Docs {
            command: DocsCommands::Check { site },
        } => commands::docs::check(&site),
    }
}

/// `debug: true` in the Giltfile turns on debug logging for an overlay too.
/// A Giltfile that fails to load is reported by the overlay itself.
fn wants_debug(cli: &Cli) -> bool {
    if cli.global.debug {
        return true;
    }

    matches!(cli.command, Commands::Overlay { .. })
        && gilt_config::load(&cli.global.gilt_file).is_ok_and(|config| config.debug)
}
