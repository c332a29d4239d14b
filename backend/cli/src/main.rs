mod api;
mod capture_cmd;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use screencap_config::{
    apply_env_overrides, config_dir, config_file_path, load_config, ScreenCapConfig,
};
use screencap_logging::init_logger;
use screencap_service::ScreenCaptureService;

use api::AppState;

#[derive(Parser)]
#[command(name = "screencap")]
#[command(about = "Capture the screen, encode it as PNG and upload it over HTTP")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.screencap/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture once, upload, and print the completion event
    Capture {
        /// Destination URL for the PNG
        #[arg(long)]
        url: String,
        /// Correlation token echoed in the completion event
        #[arg(long)]
        call_guid: Option<String>,
    },
    /// Serve the JSON-RPC API and the completion event stream
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            // logging is not configured yet
            eprintln!("screencap: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_logger(&config.logging.level, config.logging.dir.as_deref());
    if let Err(e) = screencap_config::check(&config) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let outcome = match cli.command {
        Commands::Capture { url, call_guid } => {
            capture_cmd::run(&config, &url, call_guid.as_deref())
                .await
                .map(|event| event.succeeded)
        }
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await.map(|_| true)
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("screencap failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Read the config file and apply environment overrides. Validation runs once
/// logging is up so its warnings are visible.
async fn load(path: Option<&std::path::Path>) -> Result<ScreenCapConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_file_path(&config_dir()),
    };
    let config = load_config(&path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    apply_env_overrides(config)
}

async fn run_server(config: ScreenCapConfig) -> Result<()> {
    info!(
        port = config.server.port,
        bind = %config.server.bind_address,
        backend = config.capture.backend_name(),
        "Starting screencap server"
    );

    let service = Arc::new(
        ScreenCaptureService::from_config(&config, None).context("Failed to start capture service")?,
    );

    let app = api::build_router(Arc::new(AppState {
        service: Arc::clone(&service),
    }))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "JSON-RPC API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Could not listen for shutdown signal");
            }
            info!("Shutdown requested");
        })
        .await?;

    tokio::task::spawn_blocking(move || service.shutdown())
        .await
        .context("Capture service shutdown panicked")?;
    Ok(())
}
