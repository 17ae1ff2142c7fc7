//! sendmsg receive-server
//!
//! Accepts send-message requests over HTTP and delivers them through the
//! SMS gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌─────────┐    ┌─────────┐    ┌───────────┐    ┌──────────┐
//!     ───────────────────▶│   net   │───▶│  http   │───▶│  message  │───▶│ channel  │──▶ SMS
//!                         │listener │    │ server  │    │ validator │    │   sms    │   gateway
//!                         └─────────┘    └─────────┘    └───────────┘    └──────────┘
//!
//!     Cross-cutting: config, observability (logs, metrics), lifecycle (signals, drain)
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use sendmsg::config::{load_config, ServiceConfig};
use sendmsg::lifecycle;
use sendmsg::observability::logging;

#[derive(Parser)]
#[command(name = "receive-server")]
#[command(about = "Accepts send-message requests and delivers them over SMS", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the receive-server
    Start(StartArgs),
    /// Print version information
    Version,
}

#[derive(Args)]
struct StartArgs {
    /// Host for service startup
    #[arg(short = 's', long)]
    host: Option<String>,

    /// Port for service startup
    #[arg(short, long)]
    port: Option<u16>,

    /// Path of the TOML config file
    #[arg(short = 'f', long, env = "SENDMSG_CONFIG")]
    config_path: Option<PathBuf>,

    /// Write logs to this file instead of stdout
    #[arg(long)]
    log_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Address of the Prometheus metrics endpoint
    #[arg(long)]
    addr_monitor: Option<String>,
}

impl StartArgs {
    fn apply(self, config: &mut ServiceConfig) {
        if let Some(host) = self.host {
            config.listener.host = host;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(log_path) = self.log_path {
            config.observability.log_path = Some(log_path);
        }
        if let Some(log_level) = self.log_level {
            config.observability.log_level = log_level;
        }
        if let Some(addr) = self.addr_monitor {
            config.observability.metrics_address = Some(addr);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut args = match cli.command {
        Commands::Version => {
            println!("receive-server {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Start(args) => args,
    };

    let config_path = args.config_path.take();
    let config = load_config(config_path.as_deref(), |config| args.apply(config))?;
    logging::init_logging(&config.observability)?;

    tracing::info!("receive-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_path = ?config_path,
        bind_address = %config.listener.bind_address(),
        max_connections = config.listener.max_connections,
        gateway_url = %config.sms.gateway_url,
        region_id = %config.sms.region_id,
        templates = config.templates.len(),
        strict_templates = config.strict_templates,
        metrics_address = ?config.observability.metrics_address,
        "Configuration loaded"
    );

    let report = lifecycle::start(&config).await.map_err(|e| {
        tracing::error!(error = %e, "Server failed");
        e
    })?;

    tracing::info!(
        drained = report.drained,
        open_connections = report.open_connections,
        "Shutdown complete"
    );
    Ok(())
}
