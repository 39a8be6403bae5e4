//! Assistant relay - thin relay and terminal client for an Assistants-style API
//!
//! `serve` exposes thread/message/run operations over HTTP; `chat` talks to
//! a relay (or directly to the API) and waits for replies by polling.

mod api;
mod assistant;
mod chat;
mod config;
mod poll;
mod retry;
mod session;

#[cfg(test)]
mod testing;

use api::{create_router, AppState};
use assistant::{AssistantsClient, EnvSecretStore};
use chat::{ChatController, RelayClient, SessionFile};
use clap::{Parser, Subcommand};
use config::{PollConfig, RelayConfig};
use poll::Orchestrator;
use session::{ConversationOps, SessionManager};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "assistant_relay=info";

#[derive(Debug, Parser)]
#[command(name = "assistant-relay", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP relay
    Serve {
        /// Listen port (overrides RELAY_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Chat in the terminal
    Chat {
        /// Relay base URL
        #[arg(long, env = "RELAY_URL", default_value = "http://127.0.0.1:8000")]
        relay_url: String,
        /// Call the Assistants API in-process instead of going through a relay
        #[arg(long)]
        direct: bool,
        /// Session file (default: ~/.assistant-relay/session.json)
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = RelayConfig::from_env()?;

    match cli.command {
        Command::Serve { port } => {
            init_json_logging();
            serve(config, port).await
        }
        Command::Chat {
            relay_url,
            direct,
            state,
        } => {
            init_terminal_logging();
            let store = SessionFile::new(state.unwrap_or_else(SessionFile::default_path));
            if direct {
                run_chat(session_manager(&config)?, store).await
            } else {
                tracing::debug!(relay = %relay_url, "Using relay");
                run_chat(RelayClient::new(relay_url)?, store).await
            }
        }
    }
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
}

fn init_json_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();
}

/// Human-readable logs on stderr so they stay out of the transcript
fn init_terminal_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn session_manager(
    config: &RelayConfig,
) -> Result<SessionManager<AssistantsClient, EnvSecretStore>, assistant::ApiError> {
    let client = AssistantsClient::new(config.api_base_url.clone(), config.retry.clone())?;
    let secrets = EnvSecretStore::new(&config.api_key_var, &config.assistant_id_var);
    Ok(SessionManager::new(client, secrets, config.greeting.clone()))
}

async fn serve(config: RelayConfig, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(session_manager(&config)?);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.port)));
    tracing::info!(
        %addr,
        upstream = %config.api_base_url,
        retry_attempts = config.retry.max_attempts(),
        "Assistant relay listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_chat<C: ConversationOps>(
    ops: C,
    store: SessionFile,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!(path = %store.path().display(), "Session file");
    let orchestrator = Orchestrator::new(ops, PollConfig::default());
    let mut controller = ChatController::new(orchestrator, store);
    chat::run_repl(&mut controller).await?;
    Ok(())
}
