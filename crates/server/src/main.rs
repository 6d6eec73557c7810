//! Process entry point: CLI parsing, logging setup, and the two listener
//! loops (RTMP ingest, HTTP-FLV/static egress) sharing one [`Registry`].

mod cli;
mod http;
mod rtmp;

use clap::Parser;
use tidalcast_context::Context;
use tidalcast_relay::Registry;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_logging(&args);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(args))
}

fn init_logging(args: &cli::Args) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.default_log_directive()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: cli::Args) -> anyhow::Result<()> {
    let registry = Registry::new();
    let (ctx, handler) = Context::new();

    let rtmp_task = tokio::spawn(rtmp::serve(args.rtmp_addr, registry.clone(), ctx.clone()));
    let http_task = tokio::spawn(http::serve(args.http_addr, args.web_root.clone(), registry, ctx));

    tokio::select! {
        result = shutdown_signal() => {
            result?;
            tracing::info!("shutdown signal received");
        }
        result = rtmp_task => {
            result??;
            tracing::warn!("rtmp listener exited before a shutdown signal");
        }
        result = http_task => {
            result??;
            tracing::warn!("http listener exited before a shutdown signal");
        }
    }

    handler.shutdown().await;
    tracing::info!("all sessions drained, exiting");
    Ok(())
}

/// Resolves once `ctrl_c` fires, or (on unix) `SIGTERM`. Mirrors 10.5's
/// "`ctrl_c()` and `SIGTERM` on unix" contract.
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}
