//! Finsight - filing analysis from your terminal

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

use commands::{chat_command, init_command, setup_command, status_command, stores_command};

/// Finsight - ask questions about financial filings
#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "◆ Ask questions about financial filings")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config
    Init,
    /// Chat about one uploaded filing
    Chat {
        /// Filing document named <ticker>--<form>--<date>_<timestamp>.<ext>
        file: String,
        /// Ask a single question and exit
        #[arg(short, long)]
        question: Option<String>,
        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// List knowledge stores
    Stores {
        /// Delete a store by id
        #[arg(long)]
        delete: Option<String>,
    },
    /// Show effective configuration
    Status,
    /// Interactive setup wizard
    Setup,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbose flag in Chat command
    if matches!(cli.command, Commands::Chat { verbose: true, .. }) {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }

    match cli.command {
        Commands::Init => {
            if let Err(e) = init_command().await {
                error!("Init failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Chat {
            file,
            question,
            verbose: _,
        } => {
            if let Err(e) = chat_command(file, question).await {
                error!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Stores { delete } => {
            if let Err(e) = stores_command(delete).await {
                error!("Stores failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Status => {
            if let Err(e) = status_command().await {
                error!("Status failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Setup => {
            if let Err(e) = setup_command().await {
                error!("Setup failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
