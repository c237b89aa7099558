//! spring-io-mcp: MCP server for Spring project release information
//!
//! Exposes Spring project releases, support dates and the release calendar
//! as MCP tools over stdio.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use spring_io_mcp::config::{self, Config};
use spring_io_mcp::error::StartupError;
use spring_io_mcp::mcp::server::McpServer;
use spring_io_mcp::mcp::tools::ToolRegistry;
use spring_io_mcp::springio::SpringIoClient;

/// MCP server for Spring project release information.
///
/// Provides tools that look up project releases, support dates and
/// upcoming releases from the public spring.io APIs.
#[derive(Parser, Debug)]
#[command(name = "spring-io-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Startup notice printed to stderr.
fn license_notice() -> String {
    format!(
        "spring-io-mcp {}  Copyright (C) 2026  The Embedded Society\n\
         This program comes with ABSOLUTELY NO WARRANTY.\n\
         This is free software, licensed under GPL-3.0-or-later.\n\
         Source: {}\n",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_REPOSITORY"),
    )
}

/// Builds the HTTP client and tool registry from configuration.
fn build_registry(cfg: &Config) -> Result<ToolRegistry, StartupError> {
    let projects_url = cfg.api.base_url()?;
    let calendar_url = cfg.calendar.base_url()?;

    let client = SpringIoClient::new(projects_url, calendar_url, cfg.api.timeout())
        .map_err(StartupError::HttpClient)?;

    Ok(ToolRegistry::new(client, cfg.calendar.window_days))
}

/// Entry point for the spring-io-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if let Some(default_path) = config::default_config_path() {
                eprintln!("\nDefault config location: {}", default_path.display());
                eprintln!("See config/example-config.json for the format");
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!("{}", license_notice());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting spring-io-mcp server"
    );
    info!(
        api = %cfg.api.base_url,
        calendar = %cfg.calendar.base_url,
        window_days = cfg.calendar.window_days,
        timeout_secs = cfg.api.timeout_secs,
        "Upstreams configured"
    );

    let registry = match build_registry(&cfg) {
        Ok(registry) => registry,
        Err(e) => {
            let cause = std::error::Error::source(&e).map(ToString::to_string);
            error!(error = %e, cause = ?cause, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let mut server = McpServer::new(registry);

    info!("MCP server ready, waiting for client connection...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
