//! # autoprocd
//!
//! Composition root for the autoproc server.
//!
//! Wires the adapters to the application services and starts the HTTP
//! server. No business logic lives here; this binary only constructs
//! concrete types and hands them to the application layer.

mod catalog;
mod config;

use autoproc_adapter_http_axum::router;
use autoproc_adapter_http_axum::state::AppState;
use autoproc_adapter_inprocess::InProcessEngine;
use autoproc_adapter_snapshot_json::JsonFileSnapshotStore;
use autoproc_app::config_controller::AutomationConfigController;
use autoproc_app::registry::ProcessRegistry;
use autoproc_app::services::process_automation::ProcessAutomation;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Engine
    let engine = InProcessEngine::new();
    let registry = if config.catalog.demo_enabled {
        catalog::register(&engine)?
    } else {
        ProcessRegistry::builder().build()?
    };

    // Services
    let store = JsonFileSnapshotStore::new(&config.storage.snapshot_path);
    let controller = AutomationConfigController::bootstrap(registry, engine.clone(), store).await?;
    if controller.restore_persisted().await? {
        tracing::info!(path = %config.storage.snapshot_path, "persisted configuration restored");
    }
    let automation = ProcessAutomation::new(controller, engine, config.default_timeout());

    // HTTP
    let app = router::build(AppState::new(automation));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "autoprocd listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
