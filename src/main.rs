use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

mod backend;
mod content;
mod error;
mod server;
mod session;
mod settings;

#[derive(Debug, Parser)]
#[command(name = "chat_relay")]
#[command(about = "Relays chat UI messages to a streaming chat backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Start {
        /// Address to listen on [default: 127.0.0.1:3000]
        #[arg(long)]
        listen: Option<String>,
        /// Backend base URL [default: $CHAT_RELAY_BACKEND_URL or http://localhost:8000]
        #[arg(long)]
        backend_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Start { listen, backend_url } => {
            let overrides = settings::CliOverrides { listen, backend_url };
            let resolved = settings::resolve_settings(&overrides, &settings::EnvDefaults::from_env())?;

            let metrics = match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(error = %e, "metrics recorder not installed");
                    None
                }
            };

            let state = server::AppState::new(backend::BackendClient::new(&resolved), metrics);
            server::serve(resolved.listen, state).await?;
        }
    }
    Ok(())
}
