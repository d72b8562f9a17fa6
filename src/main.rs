use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vidstream::config::ConfigManager;
use vidstream::logging::{LogConfig, init_logging};
use vidstream::{App, EventBroadcaster};

/// Command-line client for a video streaming site
#[derive(Debug, Parser)]
#[command(name = "vidstream", version, about)]
struct Cli {
    /// Configuration file (default: ~/.vidstream/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the session
    Login { username: String, password: String },
    /// End the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// List trending search keywords
    Hot {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
    /// List video categories
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(path) => ConfigManager::init_with_path(path),
        None => ConfigManager::init(),
    }
    .context("Failed to load configuration")?;

    let _log_guard =
        init_logging(LogConfig::from_config_manager()).context("Failed to initialize logging")?;
    tracing::debug!(target: "main", config = %manager.path().display(), "Starting vidstream");

    let events = EventBroadcaster::default();
    let app = App::from_config_manager(&manager, events);

    run(&app, cli.command).await
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let response = app
                .login(&username, &password)
                .await
                .context("Login failed")?;
            println!("Logged in as {}", response.user.username);
        }
        Command::Logout => {
            if !app.is_logged_in() {
                println!("Not logged in");
                return Ok(());
            }
            if let Err(e) = app.logout().await {
                tracing::warn!(target: "main", error = %e, "Server logout failed, local session removed");
            }
            println!("Logged out");
        }
        Command::Whoami => {
            if !app.is_logged_in() {
                println!("Not logged in");
                return Ok(());
            }
            let user = app
                .current_user()
                .await
                .context("Failed to fetch account")?;
            let vip = if user.is_vip { " (VIP)" } else { "" };
            println!("{} <{}>{}", user.username, user.email, vip);
        }
        Command::Hot { limit } => {
            let keywords = app
                .hot_keywords(limit)
                .await
                .context("Failed to fetch hot keywords")?;
            for (rank, keyword) in keywords.iter().enumerate() {
                println!("{:>3}. {} ({})", rank + 1, keyword.keyword, keyword.search_count);
            }
        }
        Command::Categories => {
            let categories = app
                .categories()
                .await
                .context("Failed to fetch categories")?;
            for category in categories.iter().filter(|c| c.is_active) {
                println!("{:<24} {:>6} videos", category.name, category.video_count);
            }
        }
    }
    Ok(())
}
