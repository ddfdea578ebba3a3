//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use dashboard_core::browse::ContentType;
use dashboard_core::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(version = "0.1")]
#[command(about = "Browse users and posts from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the API base URL from config and environment
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with your profile details (missing values are prompted for)
    Login {
        #[arg(long, value_name = "NAME")]
        first_name: Option<String>,
        #[arg(long, value_name = "NAME")]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Phone number in +254XXXXXXXXX format
        #[arg(long, value_name = "PHONE")]
        phone: Option<String>,
    },

    /// Log out and clear the saved session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List users or posts
    List {
        /// What to list: users or posts
        #[arg(value_name = "TYPE", default_value = "users")]
        kind: ContentType,

        /// Only show entries matching this text
        #[arg(short, long, value_name = "TEXT")]
        search: Option<String>,
    },

    /// Show a user or post with its related data
    Show {
        /// What to show: user or post
        #[arg(value_name = "TYPE")]
        kind: ContentType,

        /// Numeric ID of the record
        #[arg(value_name = "ID")]
        id: u64,
    },

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
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::Config::load().context("load config")?;
    if let Some(url) = cli.api_url.as_deref().map(str::trim)
        && !url.is_empty()
    {
        config.api.base_url = Some(url.to_string());
    }

    // Logging is best effort; a read-only home must not block commands.
    let _log_guard = logging::init(&config).ok();
    tracing::debug!(base_url = %config.api.effective_base_url(), "config loaded");

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli.command, &config).await })
}

async fn dispatch(command: Commands, config: &config::Config) -> Result<()> {
    match command {
        Commands::Login {
            first_name,
            last_name,
            email,
            phone,
        } => commands::auth::login(commands::auth::LoginArgs {
            first_name,
            last_name,
            email,
            phone,
        }),
        Commands::Logout => commands::auth::logout(),
        Commands::Whoami => commands::auth::whoami(),

        Commands::List { kind, search } => {
            commands::browse::list(config, kind, search.as_deref()).await
        }
        Commands::Show { kind, id } => commands::browse::show(config, kind, id).await,

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
