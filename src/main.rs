//! KenyaPolitics Predict CLI
//!
//! Terminal front end for the prediction-market client:
//! - Show the home view (stats, markets, session)
//! - Log in / register / log out
//! - List markets by sort order
//! - Check backend health

use anyhow::Context;
use clap::{Parser, Subcommand};
use predict_client::{
    ApiClient, Command, Config, Coordinator, DispatchOutcome, LoggingConfig, MarketApi, Notice,
    TerminalRenderer, ViewState,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "predict")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trade on Kenyan political events from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend origin (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the saved session (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show platform stats, recent markets and session state
    Home,

    /// Log in and save the session
    Login {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account (log in afterwards)
    Register {
        #[arg(long)]
        phone: String,
        /// Name registered with M-Pesa
        #[arg(long)]
        mpesa_name: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the saved session
    Logout,

    /// List markets
    Markets {
        /// Sort order (newest, volume, or any server-side token)
        #[arg(short, long, default_value = "newest")]
        sort: String,
    },

    /// Check backend health
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = dir.to_string_lossy().to_string();
    }

    init_logging(&config.logging);
    tracing::debug!(api = %config.api.base_url, data_dir = %config.storage.data_dir, "Starting");

    let commands = match cli.command {
        Commands::Config { output } => {
            let template = predict_client::config::generate_default_config();
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &template)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", template),
            }
            return Ok(());
        }
        Commands::Status => return status(&config).await,
        Commands::Home => vec![Command::Initialize],
        Commands::Login { phone, password } => vec![Command::Login { phone, password }],
        Commands::Register {
            phone,
            mpesa_name,
            password,
        } => vec![
            Command::Initialize,
            Command::Register {
                phone,
                mpesa_name,
                password,
            },
        ],
        Commands::Logout => vec![Command::Logout, Command::Initialize],
        Commands::Markets { sort } => vec![
            Command::Initialize,
            Command::LoadMarkets(sort.parse().unwrap_or_default()),
        ],
    };

    let renderer = Arc::new(TerminalRenderer::new());
    let coordinator = Coordinator::from_config(&config, renderer.clone())
        .context("creating HTTP client")?;

    let mut failed = false;
    for command in commands {
        match coordinator.dispatch(command).await {
            DispatchOutcome::Notice(Notice::Error(_)) => failed = true,
            DispatchOutcome::Markets(predict_client::MarketsLoad::Failed(reason)) => {
                eprintln!("Could not refresh markets: {}", reason);
            }
            _ => {}
        }
    }

    renderer.present();

    if failed || matches!(coordinator.view_state().await, ViewState::Error { .. }) {
        std::process::exit(1);
    }
    Ok(())
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.api).context("creating HTTP client")?;

    match client.health_check().await {
        Ok(()) => {
            println!("API Status: Operational");
            println!("Health check: {}", client.health_url());
            Ok(())
        }
        Err(e) => {
            eprintln!("Cannot reach the backend at {}", client.base_url());
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("predict_client={0},predict={0}", config.level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so rendered views stay clean on stdout
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
