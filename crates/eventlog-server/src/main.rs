//! Eventlog server entry point.

use std::sync::Arc;
use tokio::sync::Mutex;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use eventlog_server::config::{resolve_addr, resolve_log_path};
use eventlog_server::session::LogSessionManager;
use eventlog_server::transport::HttpTransport;

#[derive(Parser)]
#[command(
    name = "eventlog-server",
    about = "HTTP server for the event log service: ingestion, log queries and time summaries",
    version
)]
struct Cli {
    /// Path to .evlog event log file.
    #[arg(short, long)]
    file: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default).
    Serve {
        /// Listen address (host:port). Also reads EVENTLOG_ADDR.
        #[arg(long)]
        addr: Option<String>,

        /// Path to .evlog event log file.
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Validate a .evlog event log file.
    Validate,

    /// Print server routes and resolved configuration as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   eventlog-server completions bash > /etc/bash_completion.d/eventlog-server
    ///   eventlog-server completions zsh > ~/.zfunc/_eventlog-server
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

const ROUTES: &[&str] = &[
    "POST /receive",
    "GET /query",
    "GET /logs",
    "GET /timeSummary",
    "GET /intentSummary",
    "GET /sourceStats",
    "GET /source",
    "GET /health",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        addr: None,
        file: None,
    }) {
        Commands::Serve { addr, file } => {
            let log_path = resolve_log_path(file.or(cli.file).as_deref());
            let addr = resolve_addr(addr.as_deref());
            tracing::info!("Eventlog server");
            tracing::info!("Event log: {log_path}");

            let session = LogSessionManager::open(&log_path)?;
            let transport = HttpTransport::new(Arc::new(Mutex::new(session)));
            transport.run(&addr).await?;
        }

        Commands::Validate => {
            let log_path = resolve_log_path(cli.file.as_deref());
            match LogSessionManager::open(&log_path) {
                Ok(session) => {
                    let store = session.store();
                    println!("Valid event log: {log_path}");
                    println!("  Records: {}", store.count());
                    println!("  Sources: {}", store.sources().len());
                }
                Err(e) => {
                    eprintln!("Invalid event log: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            let info = serde_json::json!({
                "server": { "name": "eventlog-server", "version": env!("CARGO_PKG_VERSION") },
                "event_log": resolve_log_path(cli.file.as_deref()),
                "addr": resolve_addr(None),
                "routes": ROUTES,
                "route_count": ROUTES.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "eventlog-server", &mut std::io::stdout());
        }
    }

    Ok(())
}
