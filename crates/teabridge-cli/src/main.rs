//! Teabridge - LDAP directory bridge for Gitea
//!
//! Serves Gitea users to LDAP clients: simple bind against Gitea passwords
//! and read-only search over a generated user tree.

mod telemetry;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use teabridge_core::config::BridgeConfig;
use teabridge_directory::DirectoryBridge;
use teabridge_gitea::GiteaStore;
use teabridge_server::LdapServer;
use tracing::info;

#[derive(Parser)]
#[command(name = "teabridge")]
#[command(author = "Teabridge Team")]
#[command(version = teabridge_core::VERSION)]
#[command(about = "LDAP directory bridge for Gitea", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TEABRIDGE_CONFIG")]
    config: Option<String>,

    /// LDAP listen address
    #[arg(long, env = "TEABRIDGE_LDAP_LISTEN_ADDR")]
    listen: Option<String>,

    /// Directory base DN
    #[arg(long, env = "TEABRIDGE_LDAP_BASE_DN")]
    base_dn: Option<String>,

    /// Usernames allowed to search, comma separated
    #[arg(long, env = "TEABRIDGE_LDAP_SEARCHERS", value_delimiter = ',')]
    searchers: Option<Vec<String>>,

    /// Gitea database URL
    #[arg(long, env = "TEABRIDGE_DATABASE_URL")]
    database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TEABRIDGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long, env = "TEABRIDGE_LOG_FORMAT")]
    log_format: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Start the LDAP server
    Serve,

    /// Validate the configuration and print it with secrets masked
    CheckConfig,

    /// Show version information
    Version,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path))?,
            None => BridgeConfig::from_env(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut BridgeConfig) {
        if let Some(listen) = &self.listen {
            config.ldap.listen_address = listen.clone();
        }
        if let Some(base_dn) = &self.base_dn {
            config.ldap.base_dn = base_dn.clone();
        }
        if let Some(searchers) = &self.searchers {
            config.ldap.searchers = searchers
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Commands::Serve) {
        Commands::Version => {
            print_banner();
        }
        Commands::CheckConfig => {
            let config = cli.load_config()?;
            config.validate()?;
            print!("{}", toml::to_string_pretty(&config.redacted())?);
        }
        Commands::Serve => {
            let config = cli.load_config()?;
            config.validate()?;

            telemetry::init_logging(&config.logging);
            telemetry::init_metrics(&config.metrics)?;

            print_banner();
            run_server(config).await?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(r#"
    _____           _          _     _
   |_   _|__  __ _ | |__  _ __(_) __| | __ _  ___
     | |/ _ \/ _` || '_ \| '__| |/ _` |/ _` |/ _ \
     | |  __/ (_| || |_) | |  | | (_| | (_| |  __/
     |_|\___|\__,_||_.__/|_|  |_|\__,_|\__, |\___|
                                       |___/
   LDAP Directory Bridge for Gitea
   Version: {}
"#, teabridge_core::VERSION);
}

async fn run_server(config: BridgeConfig) -> anyhow::Result<()> {
    info!("Starting Teabridge server...");
    info!("Base DN: {}", config.ldap.base_dn);
    info!("Database: {}", config.redacted().database.url);
    if !config.cache.enabled() {
        info!("Snapshot cache disabled");
    }

    let store = GiteaStore::connect(&config.database)
        .await
        .context("Failed to connect to the Gitea database")?;
    let bridge = Arc::new(DirectoryBridge::new(&config, Arc::new(store))?);

    let server = LdapServer::new(bridge, config.ldap.listen_address.clone());
    server.run_until(shutdown_signal()).await?;

    info!("Teabridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
