//! Pushhook entry point.
//!
//! This binary is the composition root for the whole system. Responsibilities:
//!
//! 1. **Parse configuration**: command-line flags with `PUSHHOOK_*`
//!    environment fallbacks (see [`config::Config`]).
//! 2. **Wire observability**: configure `tracing-subscriber` with an
//!    `EnvFilter` and either a human-readable or a JSON layer. All `tracing`
//!    spans and events from every crate in the workspace flow through it.
//! 3. **Construct infrastructure**: the [`sink::JsonLinesSink`] that hands
//!    change records to the scheduler over stdout, and the webhook router.
//! 4. **Serve**: run the webhook listener until Ctrl-C.

mod config;
mod sink;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use listener::HookServer;

use config::Config;
use sink::JsonLinesSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    telemetry::init(config.log_format);

    tracing::info!(
        bind = %config.bind,
        path = %config.path,
        ssh_host = %config.ssh_host,
        max_body = config.max_body,
        "Starting pushhook"
    );

    let sink = Arc::new(JsonLinesSink::new(tokio::io::stdout()));
    let app = HookServer::new(sink)
        .path(config.path.clone())
        .config(config.hook_config())
        .body_limit(config.max_body)
        .build();

    listener::serve(config.bind, app, shutdown_signal())
        .await
        .context("webhook listener failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
