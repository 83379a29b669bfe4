//! Daemon bootstrap: load configuration, open storage, connect the
//! inference pool, and run the three listeners to completion.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use diesel_async::AsyncConnection;
use tokio::{net::TcpListener, signal, sync::watch, task::JoinSet};
use tracing::{error, info, warn};

use super::{cli::AppConfig, frame_tcp, frame_udp};
use crate::{
    db::{DbConnection, Pools, apply_migrations},
    inference::InferencePool,
    log_sink::LogSink,
    pipeline::PipelineContext,
    rest::{self, AppState},
};

/// Deadline the shutdown sequence waits for in-flight listeners to drain.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);

/// Number of concurrent readers sized for the read pool. The write pool is
/// always capped at one connection (see [`crate::db::Pools`]).
const READ_POOL_SIZE: u32 = 8;

/// Run the daemon: migrate, connect the inference pool, and serve the three
/// listeners until a shutdown signal arrives or a listener fails fatally.
///
/// # Errors
/// Returns any error opening the database, connecting the inference pool, or
/// binding a listener.
pub async fn run_daemon(cfg: AppConfig) -> Result<()> {
    let mut migration_conn = DbConnection::establish(&cfg.database)
        .await
        .with_context(|| format!("failed to open database at '{}'", cfg.database))?;
    apply_migrations(&mut migration_conn, &cfg.database)
        .await
        .context("failed to apply database migrations")?;
    drop(migration_conn);

    let pools = Pools::establish(&cfg.database, READ_POOL_SIZE)
        .await
        .context("failed to establish database connection pools")?;

    let inference = match InferencePool::connect(&cfg.inference_host, cfg.inference_port, cfg.inference_pool_size)
        .await
    {
        Ok(pool) => {
            info!(host = %cfg.inference_host, port = cfg.inference_port, "inference pool connected");
            pool
        }
        Err(err) => {
            warn!(%err, "inference pool unavailable at startup, running degraded");
            InferencePool::degraded()
        }
    };
    let inference = Arc::new(inference);

    let log_sink = Arc::new(LogSink::open(std::path::Path::new(&cfg.log_dir)).with_context(|| {
        format!("failed to open remote-log sink under '{}'", cfg.log_dir)
    })?);

    let auth_secret: Arc<str> = Arc::from(cfg.auth_secret.as_str());

    let pipeline = Arc::new(PipelineContext {
        auth_secret: auth_secret.clone(),
        inference,
        write_pool: pools.write.clone(),
    });

    let rest_state = AppState {
        pools,
        auth_secret,
        log_sink,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut listeners = JoinSet::new();

    listeners.spawn(frame_tcp::serve(
        cfg.bind_frame.clone(),
        Duration::from_secs(cfg.idle_timeout_secs),
        pipeline.clone(),
        shutdown_rx.clone(),
    ));
    listeners.spawn(frame_udp::serve(
        cfg.bind_udp.clone(),
        Duration::from_secs(cfg.udp_chunk_staleness_secs),
        Duration::from_secs(cfg.udp_sweep_interval_secs),
        pipeline,
        shutdown_rx.clone(),
    ));
    listeners.spawn(serve_rest(cfg.bind_rest.clone(), rest_state, shutdown_rx));

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, notifying listeners");
    let _ = shutdown_tx.send(true);

    let drained = tokio::time::timeout(SHUTDOWN_DEADLINE, drain(&mut listeners)).await;
    if drained.is_err() {
        warn!("listeners did not drain within the shutdown deadline, exiting anyway");
    }

    Ok(())
}

async fn drain(listeners: &mut JoinSet<Result<()>>) {
    while let Some(outcome) = listeners.join_next().await {
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(%err, "listener exited with error"),
            Err(err) => error!(%err, "listener task panicked"),
        }
    }
}

async fn serve_rest(bind: String, state: AppState, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let listener = TcpListener::bind(&bind).await?;
    info!(%bind, "rest surface listening");
    let router = rest::router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};
        let Ok(mut term) = unix_signal(SignalKind::terminate()) else {
            let _ = signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}
