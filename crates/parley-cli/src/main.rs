use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use parley_core::{ChatRelay, ChatRequest, ProviderSettings};
use parley_gateway::GatewayServer;

mod config;

use config::{ParleyConfig, ServerConfig};

#[derive(Parser)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "parley — relay chat messages to ChatGPT, Grok and OpenRouter")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send a one-shot message through the relay
    Ask {
        /// Provider tag: chatgpt, grok or openrouter
        #[arg(short, long, default_value = "chatgpt")]
        provider: String,

        /// The message to send
        message: String,
    },

    /// List providers and whether each has a credential
    Providers,

    /// Write a default config file
    Init,

    /// Show the effective configuration (keys masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(&cli.config, host, port).await,
        Commands::Ask { provider, message } => cmd_ask(&cli.config, provider, message).await,
        Commands::Providers => cmd_providers(&cli.config),
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config),
    }
}

fn build_relay(cfg: &ParleyConfig) -> Result<Arc<ChatRelay>> {
    let relay = ChatRelay::from_settings(&cfg.provider_settings())
        .context("Failed to initialize providers")?;
    Ok(Arc::new(relay))
}

async fn cmd_serve(
    config_path: &Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let cfg = ParleyConfig::load(config_path)?;
    let host = host.unwrap_or_else(|| cfg.server.host.clone());
    let port = port.unwrap_or(cfg.server.port);
    let bind: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    let relay = build_relay(&cfg)?;
    info!("Starting parley gateway on {}", bind);

    GatewayServer::new(bind, relay)
        .with_cors_origins(cfg.server.cors_origins.clone())
        .run_until(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn cmd_ask(config_path: &Option<PathBuf>, provider: String, message: String) -> Result<()> {
    let cfg = ParleyConfig::load(config_path)?;
    let relay = build_relay(&cfg)?;

    let response = relay.route(&ChatRequest::new(message, provider)).await?;

    println!("{}", response.response);
    Ok(())
}

fn cmd_providers(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = ParleyConfig::load(config_path)?;

    println!("{:<12} {:<12} {:<30} {:<7} BASE URL", "TAG", "NAME", "MODEL", "KEY");
    for settings in cfg.provider_settings() {
        let key = if settings.api_key.is_empty() {
            "missing"
        } else {
            "set"
        };
        println!(
            "{:<12} {:<12} {:<30} {:<7} {}",
            settings.kind.tag(),
            settings.kind.display_name(),
            settings.model,
            key,
            settings.base_url
        );
    }
    Ok(())
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config::default_config_path();
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    let default_config = include_str!("../../../config/default.toml");
    tokio::fs::write(&config_path, default_config).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    info!("Created default config at {}", config_path.display());
    println!("parley initialized at {}", config_dir.display());
    println!(
        "Set OPENAI_API_KEY, GROQ_API_KEY and OPENROUTER_API_KEY, or edit {}.",
        config_path.display()
    );
    Ok(())
}

fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let cfg = ParleyConfig::load(config_path)?;
    println!("{}", render_config(&cfg.server, &cfg.provider_settings()));
    Ok(())
}

/// Server settings plus each provider as the relay will build it
fn render_config(server: &ServerConfig, providers: &[ProviderSettings]) -> String {
    format!("{:#?}\n{:#?}", server, providers)
}
