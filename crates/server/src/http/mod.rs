mod live;
mod static_files;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use http_body_util::combinators::BoxBody;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tidalcast_context::Context;
use tidalcast_relay::Registry;
use tokio::net::TcpListener;

/// The boxed body type every handler returns, so `live`'s streamed chunks and
/// `static_files`'/error responses' buffered bodies can share one signature.
pub type ResponseBody = BoxBody<bytes::Bytes, std::convert::Infallible>;

/// Accepts HTTP connections until `ctx` is cancelled, serving each with a
/// plain HTTP/1.1 connection (6's surface is GET-only, no need for h2/h3).
/// Like the RTMP listener, connections already being served are left to
/// finish on their own rather than cut off.
pub async fn serve(addr: SocketAddr, web_root: PathBuf, registry: Registry, ctx: Context) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await.with_context(|| format!("failed to bind HTTP listener on {addr}"))?;
    tracing::info!(%addr, "http listener bound");

    let web_root = Arc::new(web_root);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!(%err, "http accept error");
                        continue;
                    }
                };

                let registry = registry.clone();
                let web_root = Arc::clone(&web_root);
                let _conn_ctx = ctx.clone();

                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let registry = registry.clone();
                        let web_root = Arc::clone(&web_root);
                        async move { Ok::<_, std::convert::Infallible>(route(req, &registry, &web_root).await) }
                    });

                    if let Err(err) = hyper::server::conn::http1::Builder::new().serve_connection(io, service).await {
                        tracing::debug!(%err, %peer_addr, "http connection error");
                    }
                });
            }
            () = ctx.done() => {
                tracing::info!("http listener shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Routes a request to the live-stream handler (any two-segment path, used
/// verbatim as the registry key) or the static file server, matching
/// `Registry`'s `/app/stream` key normalization so a URL like `/live/123`
/// needs no rewriting to become a lookup key.
async fn route(req: Request<Incoming>, registry: &Registry, web_root: &std::path::Path) -> Response<ResponseBody> {
    if req.method() != Method::GET {
        return empty_response(StatusCode::METHOD_NOT_ALLOWED);
    }

    let path = req.uri().path();
    if is_stream_path(path) {
        live::serve(registry, path).await
    } else {
        static_files::serve(web_root, path).await
    }
}

/// A path is a stream lookup only under the reserved `/live/` prefix, e.g.
/// `/live/123` (6's placeholder test key); everything else (`/`,
/// `/index.html`, `/assets/x.js`) falls through to the static file server,
/// including two-segment paths that happen to live one directory down.
fn is_stream_path(path: &str) -> bool {
    let mut segments = path.trim_start_matches('/').split('/');
    matches!((segments.next(), segments.next(), segments.next()), (Some("live"), Some(stream), None) if !stream.is_empty())
}

fn empty_response(status: StatusCode) -> Response<ResponseBody> {
    use http_body_util::{BodyExt, Empty};
    Response::builder()
        .status(status)
        .body(Empty::new().map_err(|never: std::convert::Infallible| match never {}).boxed())
        .expect("static response parts are always valid")
}

#[cfg(test)]
mod tests {
    use super::is_stream_path;

    #[test]
    fn only_the_live_prefix_routes_to_stream_lookup() {
        assert!(is_stream_path("/live/123"));
        assert!(!is_stream_path("/assets/x.js"));
        assert!(!is_stream_path("/css/app.css"));
        assert!(!is_stream_path("/"));
        assert!(!is_stream_path("/index.html"));
        assert!(!is_stream_path("/live/"));
    }
}
