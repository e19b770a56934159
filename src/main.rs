//! Backstop - CLI Entry Point

use anyhow::Result;
use backstop::{server, EndpointRegistry, ServerConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "backstop",
    about = "Configurable HTTP mock server - virtual endpoints with canned responses and latency simulation",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "backstop.yaml")]
    config: PathBuf,

    /// Bind address (overrides the config file)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Bind port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print a sample configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Print sample config if requested
    if args.print_config {
        print!("{}", serde_yaml::to_string(&ServerConfig::sample())?);
        return Ok(());
    }

    // Load configuration
    let mut config = if args.config.exists() {
        info!(path = ?args.config, "Loading configuration");
        ServerConfig::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Configuration file not found: {:?}", args.config);
    } else {
        info!("Using default configuration (no seed endpoints)");
        ServerConfig::default()
    };

    // Validate and exit if requested
    if args.validate {
        config.validate()?;
        println!(
            "Configuration is valid ({} seed endpoints defined)",
            config.endpoints.len()
        );
        return Ok(());
    }

    // CLI overrides
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // Seed the registry through the normal add path so uniqueness and id
    // assignment hold from the first request.
    let registry = EndpointRegistry::new();
    for endpoint in config.endpoints.drain(..) {
        let stored = registry.add(endpoint).await?;
        info!(id = stored.id, path = %stored.path, "Seeded endpoint");
    }

    server::run(config, registry).await
}
