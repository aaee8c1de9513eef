//! Concrete Property Predictor - Main Entry Point
//!
//! Loads the three property models once, then answers prediction requests
//! read from stdin (one JSON object per line) with one JSON report per line.

use anyhow::Result;
use concrete_property_predictor::{
    config::AppConfig, metrics::PredictionMetrics, models::ModelRegistry, serve_lines,
    PredictionDispatcher,
};
use std::io;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load configuration before logging so the level and format apply from the start
    let loaded = AppConfig::load();
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => AppConfig::default(),
    };

    init_logging(&config)?;

    info!("Starting Concrete Property Predictor");
    match loaded {
        Ok(_) => info!("Configuration loaded successfully"),
        Err(e) => {
            let reason = format!("{e:#}");
            warn!(error = %reason, "Configuration not loaded, using defaults");
        }
    }

    // Load models once; the registry is read-only from here on
    let registry = ModelRegistry::load(&config.models);
    for status in registry.status() {
        if status.available {
            info!(property = %status.property, path = %status.path.display(), "Model available");
        } else {
            warn!(
                property = %status.property,
                path = %status.path.display(),
                reason = status.reason.as_deref().unwrap_or("unknown"),
                "Model unavailable, requests for this property will be refused"
            );
        }
    }

    let metrics = PredictionMetrics::new();
    let dispatcher = PredictionDispatcher::new(&registry)
        .with_metrics(&metrics)
        .with_decimals(config.output.decimals);

    info!("Reading prediction requests from stdin");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let answered = serve_lines(&dispatcher, stdin.lock(), stdout.lock())?;

    info!(reports = answered, "Input closed, shutting down");
    metrics.print_summary();

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let level = config.logging.level_filter();
    let directive = format!(
        "concrete_property_predictor={}",
        level.unwrap_or(LevelFilter::INFO)
    )
    .to_ascii_lowercase();
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    // Logs go to stderr; stdout carries the reports
    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    if level.is_none() {
        warn!(level = %config.logging.level, "Unknown log level, falling back to info");
    }

    Ok(())
}
