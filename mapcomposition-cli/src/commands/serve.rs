//! Serve command - run the HTTP front-end.

use std::sync::Arc;

use clap::Args;
use tracing::info;

use mapcomposition::config::ConfigFile;
use mapcomposition::legend::SwatchRenderer;
use mapcomposition::logging::{init_logging, DEFAULT_LOG_FILE};
use mapcomposition::server::{self, CancellationToken, ServerConfig};
use mapcomposition::service::{MapCompositionService, ServiceRegistry};

use crate::error::CliError;

/// Arguments for the serve command.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(long)]
    pub bind: Option<String>,

    /// Port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Run the serve command.
pub fn run(args: ServeArgs) -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();

    let _guard = init_logging(
        &config.logging.directory,
        DEFAULT_LOG_FILE,
        &config.logging.level,
    )
    .map_err(CliError::Logging)?;

    let server_config = ServerConfig {
        bind: args.bind.unwrap_or_else(|| config.server.bind.clone()),
        port: args.port.unwrap_or(config.server.port),
    };

    let composition = MapCompositionService::new()
        .with_wfs_precision(config.composition.wfs_precision)
        .with_renderer(Box::new(SwatchRenderer::new(config.composition.legend_size)));
    let registry = Arc::new(ServiceRegistry::with_default_services(composition));

    println!("MapComposition server v{}", mapcomposition::VERSION);
    println!("Listening on {}:{}", server_config.bind, server_config.port);
    println!("Press Ctrl+C to stop");
    println!();

    info!(
        bind = %server_config.bind,
        port = server_config.port,
        "starting front-end"
    );

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Config(format!("failed to create runtime: {}", e)))?;

    runtime.block_on(async {
        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                signal_token.cancel();
            }
        });

        server::run(registry, &server_config, shutdown).await
    })?;

    Ok(())
}
