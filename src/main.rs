mod adapters;
mod api;
mod config;
mod core;
mod telemetry;
#[cfg(all(test, unix))]
mod test_support;

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

use crate::adapters::kubectl::KubectlClient;
use crate::config::AppConfig;
use crate::core::dispatch::ActionDispatcher;
use crate::core::poller;
use crate::core::store::ClusterStateStore;
use crate::telemetry::SutsFormatter;

pub struct AppState {
    pub config: AppConfig,
    pub kubectl: KubectlClient,
    pub store: ClusterStateStore,
    pub dispatcher: ActionDispatcher,
    pub tx: broadcast::Sender<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::load();

    // --- SUTS v4.0 LOGGING SETUP ---
    let rust_log_env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&rust_log_env))?;
    let subscriber = Registry::default().with(env_filter);

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    if log_format == "json" {
        let suts_formatter = SutsFormatter::new(
            "kubemon-service".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
            cfg.env.clone(),
            cfg.node_name.clone(),
        );
        subscriber.with(fmt::layer().event_format(suts_formatter)).init();
    } else {
        subscriber.with(fmt::layer().compact()).init();
    }

    info!(
        event = "SYSTEM_STARTUP",
        service.version = env!("CARGO_PKG_VERSION"),
        node.name = %cfg.node_name,
        control_plane = %cfg.kubectl_bin,
        poll_interval_s = cfg.poll_interval,
        "💠 SENTIRIC KUBEMON (CLUSTER EYE) Booting..."
    );

    let (tx, _) = broadcast::channel::<String>(100);

    let kubectl = KubectlClient::new(&cfg.kubectl_bin, cfg.query_timeout, cfg.action_timeout);

    let state = Arc::new(AppState {
        config: cfg.clone(),
        kubectl: kubectl.clone(),
        store: ClusterStateStore::new(),
        dispatcher: ActionDispatcher::new(kubectl),
        tx,
    });

    let (stop_tx, stop_rx) = watch::channel(false);
    let poller_handle = poller::spawn_poller(state.clone(), stop_rx);

    let app = api::routes::create_router(state.clone());
    let addr = format!("{}:{}", cfg.host, cfg.http_port);
    info!(event = "HTTP_LISTEN", addr = %addr, "HTTP arayüzü dinlemede");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Kapanışta süren poll turunun bitmesi beklenir, yarıda kesilmez.
    let _ = stop_tx.send(true);
    poller_handle.await?;

    info!(event = "SYSTEM_SHUTDOWN", "Servis düzgün biçimde kapandı");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!(event = "SHUTDOWN_REQUESTED", "Kapanış sinyali alındı");
}
