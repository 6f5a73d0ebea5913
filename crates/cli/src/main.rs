//! Tierline CLI, the main entry point.
//!
//! Commands:
//! - `serve`  : Start the HTTP API
//! - `chat`   : Interactive or single-message conversation with one agent
//! - `config` : Print the effective (or default) configuration
//! - `doctor` : Diagnose configuration health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tierline",
    about = "Tierline: confidence-tiered customer support orchestrator",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with a configured agent
    Chat {
        /// Agent id
        #[arg(short, long)]
        agent: String,

        /// Company the agent belongs to
        #[arg(short, long)]
        company: String,

        /// End user id recorded with the conversation
        #[arg(short, long, default_value = "cli-user")]
        user: String,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print the configuration as TOML
    Config {
        /// Print built-in defaults instead of the loaded file
        #[arg(long)]
        default: bool,
    },

    /// Diagnose configuration health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat {
            agent,
            company,
            user,
            session,
            message,
        } => {
            let target = commands::chat::ChatTarget {
                agent_id: agent,
                company_id: company,
                user_id: user,
                session_id: session,
            };
            commands::chat::run(target, message).await?
        }
        Commands::Config { default } => commands::config_cmd::run(default)?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
