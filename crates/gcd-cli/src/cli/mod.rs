//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gcd_core::{config, interrupt, logging};

mod commands;

/// Log filter for non-interactive commands when `GCD_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "gcd=info,gcd_core=warn";

#[derive(Parser)]
#[command(name = "gcd")]
#[command(version)]
#[command(about = "Select classroom courses and download them as one archive")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Check whether the stored session is signed in
    Status,

    /// Sign in through the identity provider
    Login {
        /// Store this session cookie (value or `name=value`) instead of opening the browser
        #[arg(long, value_name = "COOKIE")]
        cookie: Option<String>,
    },

    /// List available courses
    Courses {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,

        /// Import new courses from the provider before listing
        #[arg(long)]
        refresh: bool,
    },

    /// Export courses and download the archive
    Download {
        /// Course ID to include (repeatable)
        #[arg(long = "course", value_name = "ID", required_unless_present = "all")]
        courses: Vec<String>,

        /// Include every listed course
        #[arg(long, conflicts_with = "courses")]
        all: bool,

        /// Directory to save the archive in (overrides `download.directory`)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    interrupt::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    // default to the interactive picker
    let Some(command) = cli.command else {
        return commands::interactive::run(config).await;
    };

    logging::init_stderr(DEFAULT_LOG_FILTER);

    match command {
        Commands::Status => commands::auth::status(config).await,
        Commands::Login { cookie } => commands::auth::login(config, cookie.as_deref()).await,
        Commands::Logout => commands::auth::logout(config).await,

        Commands::Courses { json, refresh } => commands::courses::list(config, json, refresh).await,

        Commands::Download {
            courses,
            all,
            output_dir,
        } => {
            let target = if all {
                commands::download::Target::All
            } else {
                commands::download::Target::Ids(courses)
            };
            commands::download::run(config, &target, output_dir).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}
