//! Voice agent worker binary.
//!
//! Serves one room: registers the intro agent with the model runtime, exposes
//! its tools on the bridge, and waits for the caller. Exits right away if a
//! supervisor is the first to join.

use handoff_agent::{bridge, config, run_job, JobOutcome, Worker};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("HANDOFF_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration, the agent cannot start without valid config");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let worker = match Worker::from_config(&config).await {
        Ok(worker) => worker,
        Err(e) => {
            tracing::error!("failed to start agent worker: {}", e);
            std::process::exit(1);
        }
    };
    let Worker {
        room,
        ctx,
        listener,
        bridge_addr,
    } = worker;

    tracing::info!(
        %bridge_addr,
        room = %room,
        identity = %ctx.agent_identity,
        "starting agent worker"
    );

    let app = bridge::router(Arc::clone(&ctx.session));
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    match run_job(&ctx).await {
        Ok(JobOutcome::SupervisorJoined { identity }) => {
            tracing::info!(identity = %identity, "supervisor took the room, agent exiting");
            server.abort();
        }
        Ok(JobOutcome::CallerJoined { identity }) => {
            tracing::info!(identity = %identity, "serving caller until shutdown");
            match server.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("tool bridge error: {}", e),
                Err(e) => tracing::error!("tool bridge task failed: {}", e),
            }
        }
        Err(e) => {
            tracing::error!(room = %room, "agent job failed: {}", e);
            server.abort();
            std::process::exit(1);
        }
    }

    tracing::info!("agent worker shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
