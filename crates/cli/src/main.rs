use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stock-track")]
#[command(about = "Historical stock data ingestion pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion scheduler (daemon mode)
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Execute one ingestion cycle and exit
    Cycle {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Fetch and process one symbol immediately
    Fetch {
        /// Symbol to fetch (e.g., "AAPL")
        #[arg(long)]
        symbol: String,
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Process currently staged documents
    Process {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Inspect or retry the deadletter queue
    Deadletter {
        #[command(subcommand)]
        action: DeadletterAction,
    },
    /// Add a symbol to the tracking worklist
    Track {
        /// Symbol to track (e.g., "AAPL")
        #[arg(long)]
        symbol: String,
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Deactivate a tracked symbol (audit trail is kept)
    Untrack {
        /// Symbol to untrack
        #[arg(long)]
        symbol: String,
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Show tracked-stock pull status and record counts
    Status {
        /// Symbol to filter by; shows all tracked symbols if omitted
        #[arg(long)]
        symbol: Option<String>,
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
}

#[derive(Subcommand)]
enum DeadletterAction {
    /// List all deadletter entries, live and abandoned
    List {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Retry every entry that is due
    Retry {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Run { config } => {
            commands::run_daemon(&config).await?;
        }
        Commands::Cycle { config } => {
            commands::run_cycle(&config).await?;
        }
        Commands::Fetch { symbol, config } => {
            commands::run_fetch(&config, &symbol).await?;
        }
        Commands::Process { config } => {
            commands::run_process(&config).await?;
        }
        Commands::Deadletter { action } => match action {
            DeadletterAction::List { config } => {
                commands::run_deadletter_list(&config).await?;
            }
            DeadletterAction::Retry { config } => {
                commands::run_deadletter_retry(&config).await?;
            }
        },
        Commands::Track { symbol, config } => {
            commands::run_track(&config, &symbol).await?;
        }
        Commands::Untrack { symbol, config } => {
            commands::run_untrack(&config, &symbol).await?;
        }
        Commands::Status { symbol, config } => {
            commands::run_status(&config, symbol.as_deref()).await?;
        }
    }

    Ok(())
}
