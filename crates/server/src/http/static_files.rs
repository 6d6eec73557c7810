use std::path::{Path, PathBuf};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Response, StatusCode};

use crate::http::ResponseBody;

/// Serves a file under `web_root`, rejecting any path that escapes it via
/// `..` components. `/` maps to `index.html` (6's static-file fallback).
pub async fn serve(web_root: &Path, request_path: &str) -> Response<ResponseBody> {
    let relative = if request_path.is_empty() || request_path == "/" {
        "index.html"
    } else {
        request_path.trim_start_matches('/')
    };

    if relative.split('/').any(|segment| segment == "..") {
        return text_response(StatusCode::BAD_REQUEST, "invalid path\n".to_owned());
    }

    let path: PathBuf = web_root.join(relative);
    match tokio::fs::read(&path).await {
        Ok(contents) => Response::builder()
            .status(StatusCode::OK)
            .header(hyper::header::CONTENT_TYPE, guess_content_type(&path))
            .body(Full::new(Bytes::from(contents)).map_err(|never: std::convert::Infallible| match never {}).boxed())
            .expect("static response parts are always valid"),
        Err(_) => text_response(StatusCode::NOT_FOUND, format!("not found: {request_path}\n")),
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("flv") => "video/x-flv",
        _ => "application/octet-stream",
    }
}

fn text_response(status: StatusCode, body: String) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(hyper::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body)).map_err(|never: std::convert::Infallible| match never {}).boxed())
        .expect("static response parts are always valid")
}
