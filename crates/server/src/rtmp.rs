use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use tidalcast_context::Context;
use tidalcast_relay::Registry;
use tidalcast_rtmp::session::Session;
use tokio::net::TcpListener;
use tracing::Instrument;

/// Accepts RTMP connections until `ctx` is cancelled, spawning one session
/// task per connection. Existing sessions are never forcibly cancelled on
/// shutdown (5's cancellation model): `ctx` is only consulted by the accept
/// loop itself, each session task just holds a clone so the caller can
/// `handler.wait()` for sessions already in flight to drain.
pub async fn serve(addr: SocketAddr, registry: Registry, ctx: Context) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await.with_context(|| format!("failed to bind RTMP listener on {addr}"))?;
    tracing::info!(%addr, "rtmp listener bound");

    let next_session_id = Arc::new(AtomicU64::new(1));

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!(%err, "rtmp accept error");
                        continue;
                    }
                };

                let session_id = next_session_id.fetch_add(1, Ordering::Relaxed);
                let registry = registry.clone();
                let _session_ctx = ctx.clone();

                let span = tracing::info_span!("rtmp_session", session_id, %peer_addr);
                tokio::spawn(
                    async move {
                        run_session(stream, &registry).await;
                        // `_session_ctx` is dropped here, releasing this task's
                        // slot in the root handler's shutdown tracker.
                    }
                    .instrument(span),
                );
            }
            () = ctx.done() => {
                tracing::info!("rtmp listener shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn run_session(stream: tokio::net::TcpStream, registry: &Registry) {
    if let Err(err) = stream.set_nodelay(true) {
        tracing::debug!(%err, "failed to set TCP_NODELAY");
    }

    tracing::info!("rtmp session started");
    let mut session = Session::new(stream);
    match session.run(registry).await {
        Ok(()) => tracing::info!("rtmp session ended"),
        Err(err) if err.is_client_closed() => tracing::info!(%err, "rtmp session ended: client closed connection"),
        Err(err) => tracing::warn!(%err, "rtmp session ended with error"),
    }
}
