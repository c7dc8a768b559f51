//! Supplier Voice Server Entry Point

use supplier_voice_config::{load_settings, Settings};
use supplier_voice_persistence::{PersistenceLayer, ScyllaConfig};
use supplier_voice_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let run_env = std::env::var("RUN_ENV").ok();
    let config = load_settings(run_env.as_deref())?;

    init_tracing(&config);
    tracing::info!("Starting Supplier Voice Server v{}", env!("CARGO_PKG_VERSION"));

    let persistence = init_persistence(&config).await;

    let state = AppState::new(config.clone(), persistence)?;
    tracing::info!("Initialized application state");

    let _cleanup_shutdown = state.registry.start_cleanup_task();

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Connect the call and search log stores, when enabled
///
/// An unreachable cluster downgrades to running without persistence rather
/// than refusing to start.
async fn init_persistence(config: &Settings) -> Option<PersistenceLayer> {
    if !config.persistence.enabled {
        tracing::info!("Persistence disabled, call logs will not be stored");
        return None;
    }

    let scylla = ScyllaConfig {
        hosts: config.persistence.hosts.clone(),
        keyspace: config.persistence.keyspace.clone(),
        replication_factor: config.persistence.replication_factor,
    };

    match supplier_voice_persistence::init(scylla).await {
        Ok(layer) => {
            tracing::info!("Persistence layer ready");
            Some(layer)
        }
        Err(e) => {
            tracing::warn!("Persistence unavailable, continuing without it: {}", e);
            None
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "supplier_voice={},tower_http=debug",
            config.observability.log_level
        )
        .into()
    });

    if config.observability.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
