//! `calcwire` server binary.
//!
//! Parses the command line, installs logging and serves until Ctrl+C.

mod cli;

use std::net::{Ipv4Addr, SocketAddr};

use calcwire::{evaluator::ConstantEvaluator, server::{CalcServer, MIN_WORKERS}};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let (workers, raised) = cli.worker_count(MIN_WORKERS);
    if raised {
        tracing::warn!(
            requested = cli.workers,
            workers,
            "worker count below minimum, using minimum"
        );
    }

    if let Some(addr) = cli.metrics_addr {
        install_metrics_exporter(addr)?;
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, cli.port));
    let server = CalcServer::new(ConstantEvaluator::default())
        .workers(workers)
        .bind(addr)?;
    tracing::info!(%addr, workers, "listening");
    server.run().await?;
    Ok(())
}

#[cfg(feature = "metrics")]
fn install_metrics_exporter(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(%addr, "metrics endpoint listening");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics_exporter(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    tracing::warn!(%addr, "built without the metrics feature, ignoring --metrics-addr");
    Ok(())
}
