use clap::{Parser, Subcommand, ValueEnum};
use hydra_core::{Broker, BrokerConfig};
use hydra_transport::ZmqRouterTransport;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hydra-broker", version, about = "The Hydra dealer/router message broker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bind the router endpoint and serve peers until interrupted.
    Start {
        #[arg(long, default_value = "127.0.0.1")]
        address: String,
        #[arg(long, default_value_t = 5556)]
        port: u16,
        #[arg(long, value_enum, default_value_t = LogLevel::Info)]
        log_level: LogLevel,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    const fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let Command::Start {
        address,
        port,
        log_level,
    } = cli.command;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.as_filter()))
        .init();

    let config = BrokerConfig::new(address, port);
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid broker configuration");
        std::process::exit(1);
    }

    let endpoint = config.endpoint();
    let transport = match ZmqRouterTransport::bind(&endpoint).await {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!(error = %e, endpoint = %endpoint, "failed to bind router endpoint");
            std::process::exit(1);
        }
    };
    tracing::info!(endpoint = %endpoint, "broker listening");

    let broker = Broker::new(transport, config);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let run_handle = tokio::spawn(broker.run(shutdown_rx));

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    if let Err(e) = run_handle.await {
        tracing::error!(error = %e, "broker task panicked");
        std::process::exit(1);
    }
    tracing::info!("broker shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful shutdown.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("received Ctrl+C, shutting down"); },
        _ = terminate => { tracing::info!("received SIGTERM, shutting down"); },
    }
}
