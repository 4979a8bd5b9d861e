use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tonic::transport::Server;
use tower::limit::ConcurrencyLimitLayer;
use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt, prelude::*};

mod cli;
mod config;
mod error;
mod metrics_server;
mod proto;
mod serializer;
mod service;

use cli::Args;
use config::Config;
use filewhisperer_engine::{BatchProcessor, Dissector, EngineMetrics, EnginePool};
use filewhisperer_extractors::FlavorRegistry;
use filewhisperer_identity::IdAllocator;
use service::FileWhispererService;

/// Largest message either direction of the RPC will accept. Uncompressed
/// input files and their digested trees can both be large; this keeps a
/// single oversized request from aborting the connection outright.
const MAX_MESSAGE_SIZE: usize = 50 * 1024 * 1024;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    setup(&args.log_level)?;

    let config = Config::load()?;
    let addr = format!("0.0.0.0:{}", args.port).parse()?;

    let registry = Arc::new(FlavorRegistry::standard());
    let ids = IdAllocator::new();

    let mut metrics_registry = prometheus_client::registry::Registry::default();
    let metrics = Arc::new(EngineMetrics::new(&mut metrics_registry));
    let metrics_registry = Arc::new(metrics_registry);

    let batch = if config.batch.ocr.enabled || config.batch.word.enabled || config.batch.pdf.enabled {
        Some(Arc::new(BatchProcessor::new(
            registry.clone(),
            config.batch.clone(),
            metrics.clone(),
        )))
    } else {
        None
    };

    let instances: Vec<Dissector> = (0..config.tree_pool_size)
        .map(|_| {
            let dissector = Dissector::new(registry.clone(), ids.clone(), metrics.clone());
            match &batch {
                Some(batch) => dissector.with_batch_processor(batch.clone()),
                None => dissector,
            }
        })
        .collect();
    let pool = Arc::new(EnginePool::new(
        instances,
        config.tree_pool_acquire_timeout,
        metrics.clone(),
    ));

    let service = FileWhispererService::new(pool, &config);
    let server = proto::file_whisperer_server::FileWhispererServer::new(service)
        .max_decoding_message_size(MAX_MESSAGE_SIZE)
        .max_encoding_message_size(MAX_MESSAGE_SIZE);

    let token = CancellationToken::new();
    let tracker = TaskTracker::new();

    let shutdown_token = token.clone();
    tracker.spawn(
        Server::builder()
            .layer(ConcurrencyLimitLayer::new(config.grpc_max_workers))
            .add_service(server)
            .serve_with_shutdown(addr, async move { shutdown_token.cancelled().await }),
    );

    let metrics_addr = format!("0.0.0.0:{}", config.metrics_port).parse()?;
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr).await?;
    let metrics_shutdown = token.clone();
    tracker.spawn(async move {
        let router = metrics_server::router(metrics_registry);
        if let Err(e) = axum::serve(metrics_listener, router)
            .with_graceful_shutdown(async move { metrics_shutdown.cancelled().await })
            .await
        {
            tracing::error!(error = %e, "metrics server exited with an error");
        }
    });

    signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    token.cancel();
    tracker.close();
    tracker.wait().await;

    Ok(())
}

fn setup(log_level: &str) -> eyre::Result<()> {
    let filter = Targets::new()
        .with_target("filewhisperer_server", Level::DEBUG)
        .with_default(Level::from_str(log_level)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    color_eyre::install()?;

    Ok(())
}
