//! dyncd — the dynamic test-cluster daemon.
//!
//! Single binary that assembles the subsystems:
//! - Docker runtime adapter
//! - Cluster metadata store (redb)
//! - Optional DNS registrar client
//! - Cluster orchestrator
//! - REST API
//!
//! # Usage
//!
//! ```text
//! dyncd run --config /etc/dyncd.toml
//! dyncd run --port 19923 --data-dir /var/lib/dyncd --docker-endpoint unix:///var/run/docker.sock
//! ```
//!
//! The periodic sweep that reclaims expired clusters runs outside this
//! daemon; it drives the same kill endpoints this binary serves.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use dync_api::build_router;
use dync_core::DaemonConfig;
use dync_dns::DnsRegistrar;
use dync_docker::DockerRuntime;
use dync_orchestrator::Orchestrator;
use dync_store::RedbMetaStore;

#[derive(Parser)]
#[command(name = "dyncd", about = "Dynamic test-cluster daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the daemon.
    Run {
        /// Path to a dyncd.toml configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state (overrides the config file).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Docker engine endpoint (overrides the config file).
        #[arg(long)]
        docker_endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dyncd=debug,dync_orchestrator=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            port,
            data_dir,
            docker_endpoint,
        } => run(config, port, data_dir, docker_endpoint).await,
    }
}

async fn run(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    docker_endpoint: Option<String>,
) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => DaemonConfig::from_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(port) = port {
        config.listen_port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    if let Some(endpoint) = docker_endpoint {
        config.docker.endpoint = endpoint;
    }

    info!(config = ?config_path, "dyncd starting");

    // Ensure the data directory exists.
    std::fs::create_dir_all(&config.data_dir)?;
    let db_path = config.data_dir.join("cluster-meta.redb");

    // ── Initialize subsystems ──────────────────────────────────────

    let store = RedbMetaStore::open(&db_path)?;
    info!(path = ?db_path, "metadata store opened");

    let runtime = DockerRuntime::connect(&config.docker.endpoint)?;
    info!(endpoint = %config.docker.endpoint, "docker runtime configured");

    let dns = config.dns.as_ref().map(|dns| {
        info!(host = %dns.host, domain = %dns.domain, "dns registrar enabled");
        Arc::new(DnsRegistrar::new(dns.host.clone(), dns.port, dns.domain.clone()))
    });

    let listen_port = config.listen_port;
    let orchestrator = Orchestrator::new(
        Arc::new(runtime),
        Arc::new(store),
        dns,
        Arc::new(config),
    );
    info!("orchestrator initialized");

    // ── Start API server ───────────────────────────────────────────

    let router = build_router(orchestrator);
    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("dyncd stopped");
    Ok(())
}
