mod cli;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tvp_core::config::Config;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path);

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting tvproxy {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    for provider in &config.providers {
        tracing::info!(
            provider = %provider.name,
            cadence_secs = provider.cadence().as_secs(),
            "Configured EPG provider"
        );
    }

    tvp_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults based on the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tvproxy=debug,tvp_server=debug,tvp_core=debug,tower_http=debug".to_string()
        } else {
            "tvproxy=info,tvp_server=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tvproxy {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = Config::load(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Data dir: {}", config.data_dir.display());
    println!("  Providers: {}", config.providers.len());
    for provider in &config.providers {
        println!(
            "    {} (every {}s) <- {}",
            provider.name,
            provider.cadence().as_secs(),
            provider.epg_url
        );
    }

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("  - {warning}");
        }
    }

    Ok(())
}
