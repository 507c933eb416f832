use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use switchboard_channels::{ChatApi, DeliveryAdapter, RecordingChatApi, RetryPolicy, SlackWebClient};
use switchboard_core::config::SwitchboardConfig;
use switchboard_middleware::{standard_chain, Pipeline};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod app;
mod handler;
mod http;
mod metrics;
mod queue;
mod redact;
mod signature;
mod worker;

#[derive(Debug, Parser)]
#[command(name = "switchboard-gateway", version, about = "Chat webhook ingestion gateway")]
struct Cli {
    /// Path to switchboard.toml (default: ~/.switchboard/switchboard.toml).
    #[arg(long, env = "SWITCHBOARD_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "switchboard_gateway=info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = SwitchboardConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(code = e.code(), error = %e, "config load failed, using defaults");
        SwitchboardConfig::default()
    });

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let cancel = CancellationToken::new();

    // outbound: real Web API client, or a recorder when no token is set
    let dry_run = config.slack.bot_token.is_empty();
    let api: Arc<dyn ChatApi> = if dry_run {
        warn!("slack.bot_token is empty; outbound calls are recorded, not sent");
        Arc::new(RecordingChatApi::new())
    } else {
        Arc::new(SlackWebClient::new(&config.slack)?)
    };
    let delivery = DeliveryAdapter::new(api, RetryPolicy::from_config(&config.slack));
    let pipeline = Arc::new(Pipeline::new(
        standard_chain(&config.middleware, delivery),
        config.slack.api_base.clone(),
    ));

    let redactor = redact::Redactor::from_config(&config.logging).unwrap_or_else(|e| {
        warn!(error = %e, "logging.redaction_key unusable; undecodable payloads are logged as digests");
        redact::Redactor::digest_only()
    });
    if redactor.is_sealing() {
        info!("undecodable payloads will be logged AES-256-GCM sealed");
    }
    let metrics = Arc::new(metrics::Metrics::new()?);

    let prune_interval = Duration::from_secs(config.dedup.prune_interval_secs.max(1));
    let turn_timeout = Duration::from_millis(config.worker.turn_timeout_ms);
    let (state, receivers) = app::AppState::new(config, Arc::clone(&metrics), redactor, dry_run);
    let state = Arc::new(state);

    let pruner = state
        .classifier
        .deduplicator()
        .spawn_pruner(prune_interval, cancel.clone());
    let workers = worker::spawn_workers(
        receivers,
        pipeline,
        Arc::new(handler::EchoHandler),
        metrics,
        turn_timeout,
        cancel.clone(),
    );
    info!(shards = workers.len(), "turn workers started");

    let router = app::build_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Switchboard gateway listening on {}", addr);

    let shutdown = cancel.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown requested");
            shutdown.cancel();
        })
        .await?;

    // stop background tasks once the listener has drained
    cancel.cancel();
    for handle in workers {
        let _ = handle.await;
    }
    let _ = pruner.await;
    info!("gateway stopped");
    Ok(())
}
