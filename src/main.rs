#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::doc_markdown)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pulseband::{Config, HttpShadowClient, IntentRouter, RequestEnvelope, ResponseEnvelope, ShadowClient};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Voice skill for a heart-rate band backed by a device shadow.
#[derive(Parser, Debug)]
#[command(name = "pulseband")]
#[command(version)]
#[command(about = "Voice skill that reads and configures a heart-rate band.")]
struct Cli {
    /// Config file (defaults to $PULSEBAND_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP skill gateway
    Serve {
        /// Listen host (overrides [gateway].host)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides [gateway].port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Handle one request envelope and print the response envelope
    Invoke {
        /// Path to a request envelope JSON file, or `-` for stdin
        path: String,
    },

    /// Inspect a device shadow
    Shadow {
        #[command(subcommand)]
        shadow_command: ShadowCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ShadowCommands {
    /// Print the current shadow document for a thing
    Get {
        /// Thing (device) name
        thing: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulseband=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            info!("Starting pulseband gateway on {host}:{port}");
            pulseband::gateway::run_gateway(&host, port, config).await
        }
        Commands::Invoke { path } => {
            let raw = read_input(&path)?;
            let envelope: RequestEnvelope =
                serde_json::from_str(&raw).context("Request is not a skill request envelope")?;

            let client: Arc<dyn ShadowClient> = Arc::new(HttpShadowClient::new(&config.shadow)?);
            let router = IntentRouter::from_config(client, &config.heartbeat);
            let response = router.handle(&envelope.into_intent_request()).await;

            println!(
                "{}",
                serde_json::to_string_pretty(&ResponseEnvelope::from(&response))?
            );
            Ok(())
        }
        Commands::Shadow { shadow_command } => match shadow_command {
            ShadowCommands::Get { thing } => {
                let client = HttpShadowClient::new(&config.shadow)?;
                let document = client.fetch_state(&thing).await?;
                println!("{}", serde_json::to_string_pretty(&document)?);
                Ok(())
            }
        },
    }
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read request from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
}
