use bytes::Bytes;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Frame;
use hyper::{Response, StatusCode};
use tidalcast_relay::{Consumer, ConsumerError, ConsumerLimits, FlvSink, Registry};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::http::ResponseBody;

/// Bridges [`Consumer::live`] to a hyper streaming response body: the
/// `live` loop runs on its own task and writes into this channel, and the
/// receiving half becomes the HTTP response's `StreamBody` (7's "streaming
/// body" requirement — the whole FLV is never buffered in memory).
struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
}

impl FlvSink for ChannelSink {
    async fn write_all(&mut self, bytes: Bytes) -> Result<(), ConsumerError> {
        self.tx.send(bytes).await.map_err(|_| ConsumerError::Closed)
    }
}

/// Handles `GET /{app}/{stream}`: attaches a consumer to the named source
/// and streams it out as `video/x-flv`, or a plain-text error if the name
/// doesn't exist or hasn't sent metadata yet.
pub async fn serve(registry: &Registry, key: &str) -> Response<ResponseBody> {
    let Some(source) = registry.get(key) else {
        return not_found(key);
    };

    let mut consumer = match source.attach(ConsumerLimits::default()) {
        Ok(consumer) => consumer,
        Err(err) => return unavailable(err),
    };

    let (tx, rx) = mpsc::channel::<Bytes>(64);
    tokio::spawn(async move {
        let mut sink = ChannelSink { tx };
        if let Err(err) = drive(&mut consumer, &mut sink).await {
            tracing::debug!(consumer_id = consumer.id(), %err, "live stream ended");
        }
    });

    let stream = ReceiverStream::new(rx).map(|chunk| Ok::<_, std::convert::Infallible>(Frame::data(chunk)));
    let body = StreamBody::new(stream).boxed();

    Response::builder()
        .status(StatusCode::OK)
        .header(hyper::header::CONTENT_TYPE, "video/x-flv")
        .body(body)
        .expect("static response parts are always valid")
}

async fn drive(consumer: &mut Consumer, sink: &mut ChannelSink) -> Result<(), ConsumerError> {
    consumer.live(sink).await
}

fn not_found(key: &str) -> Response<ResponseBody> {
    text_response(StatusCode::NOT_FOUND, format!("no live stream at {key}\n"))
}

fn unavailable(err: ConsumerError) -> Response<ResponseBody> {
    match err {
        ConsumerError::MetadataUnavailable => text_response(StatusCode::SERVICE_UNAVAILABLE, "stream has not sent metadata yet\n".to_owned()),
        other => text_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{other}\n")),
    }
}

fn text_response(status: StatusCode, body: String) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(hyper::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body)).map_err(|never: std::convert::Infallible| match never {}).boxed())
        .expect("static response parts are always valid")
}
