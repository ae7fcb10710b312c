use clap::{Parser, Subcommand};
use linkshrink::admin::{self, AdminCommands};
use linkshrink::config::Config;
use linkshrink::error::AppResult;
use linkshrink::server;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// linkshrink - A URL shortener with rolling visit statistics
#[derive(Parser, Debug)]
#[command(name = "linkshrink")]
#[command(version)]
#[command(about = "A URL shortener with rolling visit statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to (overrides SERVER_HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides SERVER_PORT env var)
        #[arg(long)]
        port: Option<u16>,

        /// Run migrations on startup
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        migrate: bool,
    },

    /// Administrative commands
    Admin {
        #[command(subcommand)]
        admin_command: AdminCommands,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    init_tracing();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::Server {
            host,
            port,
            migrate,
        } => {
            let addr = config.server.bind_addr(host, port);

            server::run_server(config, addr, migrate).await
        }
        Commands::Admin { admin_command } => admin::run(config, admin_command).await,
    }
}
