//! BigQuery Emulator CLI

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server::ServerConfig;

/// In-memory BigQuery emulator
#[derive(Debug, Parser)]
#[command(name = "fake-bigquery", version, about)]
struct Args {
    /// Host address to bind to
    #[arg(long, env = "FAKE_BIGQUERY_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "FAKE_BIGQUERY_PORT", default_value_t = 9050)]
    port: u16,

    /// BigQuery discovery document to serve
    #[arg(long, env = "FAKE_BIGQUERY_DISCOVERY_JSON")]
    discovery_json_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        discovery_json_path: args.discovery_json_path,
    };

    server::run(config)
        .await
        .with_context(|| "BigQuery emulator server failed")
}
