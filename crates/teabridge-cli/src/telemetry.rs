//! Logging and metrics setup

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use teabridge_core::config::{LoggingConfig, MetricsConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` wins over the configured level when set
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.format.as_str() {
        "json" => registry.with(fmt::layer().json().with_target(true)).init(),
        _ => registry.with(fmt::layer().with_target(true)).init(),
    }
}

pub fn init_metrics(config: &MetricsConfig) -> anyhow::Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .listen_address
        .parse()
        .with_context(|| format!("Invalid metrics address: {}", config.listen_address))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    teabridge_directory::metrics::record_build_info(teabridge_core::VERSION);
    info!("Metrics available at http://{}/metrics", addr);

    Ok(())
}
