//! Run command: the agent daemon with its reload loop
//!
//! Each pass of the loop loads the configuration, builds the pipeline, and
//! runs the agent until a signal arrives. SIGINT ends the loop; SIGHUP
//! tears the pipeline down and starts the next pass with a fresh
//! configuration.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use optic_agent::Agent;
use optic_config::Config;

pub async fn run(config_path: &Path) -> Result<()> {
    loop {
        let config = Config::from_file(config_path).context("failed to load configuration")?;
        super::validate(&config)?;

        let agent = Agent::new(config)?;

        info!(version = env!("CARGO_PKG_VERSION"), "starting optic");
        info!(sources = %agent.config().source_names().join(" "), "loaded sources");
        info!(processors = %agent.config().processor_names().join(" "), "loaded processors");
        info!(sinks = %agent.config().sink_names().join(" "), "loaded sinks");
        info!(tags = %agent.config().global_tags(), "global tags");

        agent.connect().await.context("failed to connect sinks")?;

        let shutdown = CancellationToken::new();
        let reload = Arc::new(AtomicBool::new(false));
        let signals = tokio::spawn(watch_signals(shutdown.clone(), reload.clone()));

        agent.run(shutdown).await?;
        signals.abort();

        if !reload.load(Ordering::SeqCst) {
            break;
        }
        info!("reloading optic config");
    }

    info!("optic shutdown complete");
    Ok(())
}

/// Wait for a shutdown or reload signal, then cancel the token.
async fn watch_signals(shutdown: CancellationToken, reload: Arc<AtomicBool>) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let hangup = async {
        signal::unix::signal(signal::unix::SignalKind::hangup())
            .expect("failed to install SIGHUP handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let hangup = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("shutdown signal received, stopping agent");
        }
        _ = hangup => {
            info!("reload signal received, restarting agent");
            reload.store(true, Ordering::SeqCst);
        }
    }

    shutdown.cancel();
}
