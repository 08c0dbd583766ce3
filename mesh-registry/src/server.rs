//! Process-lifetime wiring: binds the listener, spawns the Health Timer,
//! and serves until `SIGINT`/`SIGTERM`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mesh_health::HealthTimerHandle;
use mesh_store::Store;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Runs the Registry API until shutdown, serving `addr` and persisting to
/// `store`. Blocks until a graceful shutdown completes.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server exits
/// abnormally.
pub async fn run(addr: SocketAddr, store: Arc<dyn Store>, shutdown_grace: Duration) -> anyhow::Result<()> {
    let health_timer = HealthTimerHandle::spawn(store.clone());
    let state = AppState::new(store);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "mesh-registryd listening");

    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel();
    let serve_task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = signal_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = signal_tx.send(());

    match tokio::time::timeout(shutdown_grace, serve_task).await {
        Ok(joined) => joined??,
        Err(_) => info!(?shutdown_grace, "shutdown grace period elapsed, dropping remaining connections"),
    }

    health_timer.shutdown().await;
    info!("mesh-registryd stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
}
