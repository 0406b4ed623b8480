//! HR Desk CLI
//!
//! Command-line interface for the HR desk ticket portal.
//!
//! # Usage
//!
//! ```bash
//! hrdesk demo
//! hrdesk watch tickets --scope all
//! hrdesk watch notifications --format json
//! hrdesk config set api_url https://hr.example.com/api
//! ```

use clap::{Parser, Subcommand};
use hrdesk_client::TicketScope;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "hrdesk")]
#[command(version)]
#[command(about = "HR Desk Command Line Interface", long_about = None)]
struct Cli {
    /// API endpoint URL
    #[arg(long, env = "HRDESK_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the portal API
    #[arg(long, env = "HRDESK_API_TOKEN")]
    api_token: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ticket lifecycle scenario against an in-memory portal
    Demo,
    /// Poll a portal view and print every refresh until Ctrl-C
    Watch {
        #[command(subcommand)]
        target: WatchCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum WatchCommands {
    /// Ticket list or admin queue
    Tickets {
        #[arg(long, value_enum, default_value = "mine")]
        scope: ScopeArg,
        /// Case-insensitive subject or ticket number search
        #[arg(long)]
        search: Option<String>,
    },
    /// Notification bell
    Notifications {
        /// Show read notifications too
        #[arg(long)]
        all: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ScopeArg {
    Mine,
    All,
}

impl From<ScopeArg> for TicketScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Mine => TicketScope::Mine,
            ScopeArg::All => TicketScope::All,
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match config::Config::load(cli.profile.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Config not readable, using defaults");
            config::Config::default()
        }
    };
    let format = cli
        .format
        .or_else(|| config.default_format())
        .unwrap_or(output::OutputFormat::Table);
    let api_url = cli.api_url.or_else(|| config.api_url.clone());
    let api_token = cli.api_token.or_else(|| config.api_token.clone());

    let result = match cli.command {
        Commands::Demo => commands::demo::run(&config.sync, format).await,
        Commands::Watch { target } => {
            let endpoint = commands::watch::Endpoint {
                api_url,
                api_token,
                sync: config.sync.clone(),
            };
            commands::watch::handle(target, endpoint, format).await
        }
        Commands::Config { action } => commands::config::handle(action, cli.profile.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
