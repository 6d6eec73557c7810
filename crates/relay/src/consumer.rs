use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use tidalcast_flv::{FLV_FILE_HEADER, TagHeader, TagType};
use tidalcast_rtmp::messages::{DataMessage, DataMessageKind};
use tokio::sync::mpsc;

use crate::error::ConsumerError;
use crate::source::Source;

/// Caps on a single consumer's back-pressure, enforced independently: either
/// one being hit drops the offered message.
#[derive(Debug, Clone, Copy)]
pub struct ConsumerLimits {
    /// Channel capacity; also doubles as the item-count cap.
    pub max_len: usize,
    /// Payload bytes allowed in flight (queued, not yet written by the
    /// viewer's `live` loop) before messages start getting dropped.
    pub max_size: usize,
}

impl Default for ConsumerLimits {
    fn default() -> Self {
        Self {
            max_len: 32_768,
            max_size: 20 * 1024 * 1024,
        }
    }
}

/// The half of a [`Consumer`] that [`Source::handle_message`] touches: a
/// `try_send` sink plus the byte-budget accounting that makes the drop
/// policy independent of the channel's own item-count cap.
pub(crate) struct ConsumerSlot {
    pub(crate) id: u64,
    sender: mpsc::Sender<Arc<DataMessage>>,
    bytes_in_flight: Arc<AtomicUsize>,
    max_size: usize,
}

impl ConsumerSlot {
    pub(crate) fn new(id: u64, sender: mpsc::Sender<Arc<DataMessage>>, bytes_in_flight: Arc<AtomicUsize>, max_size: usize) -> Self {
        Self {
            id,
            sender,
            bytes_in_flight,
            max_size,
        }
    }

    /// Enqueues `msg` unless either cap is exceeded, in which case it is
    /// dropped silently: the publisher must never block or error on a slow
    /// consumer (5.4.3).
    pub(crate) fn offer(&self, msg: &Arc<DataMessage>) {
        let len = msg.payload.len();
        if self.bytes_in_flight.load(Ordering::Relaxed).saturating_add(len) > self.max_size {
            tracing::warn!(consumer_id = self.id, "dropping message: consumer over byte cap");
            return;
        }

        match self.sender.try_send(Arc::clone(msg)) {
            Ok(()) => {
                self.bytes_in_flight.fetch_add(len, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(consumer_id = self.id, "dropping message: consumer channel full");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

/// A snapshot of a source's priming state taken at attach time: the tags
/// every new consumer must see before any media tag (5.3's ordering
/// guarantee), regardless of when the publisher originally sent them.
#[derive(Default, Clone)]
pub(crate) struct PrimedState {
    pub(crate) metadata: Option<Bytes>,
    pub(crate) audio_config: Option<Arc<DataMessage>>,
    pub(crate) video_config: Option<Arc<DataMessage>>,
}

/// Something a remuxed FLV byte stream can be written to. Implemented for
/// plain `AsyncWrite`s (tests, and any future non-HTTP sink) and, in the
/// `server` crate, for the hyper response-body channel.
pub trait FlvSink: Send {
    fn write_all(&mut self, bytes: Bytes) -> impl Future<Output = Result<(), ConsumerError>> + Send;
}

/// Wraps any `tokio::io::AsyncWrite` as an [`FlvSink`].
pub struct AsyncWriteSink<W>(pub W);

impl<W> FlvSink for AsyncWriteSink<W>
where
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, bytes: Bytes) -> Result<(), ConsumerError> {
        use tokio::io::AsyncWriteExt;
        self.0.write_all(&bytes).await?;
        Ok(())
    }
}

/// One viewer's fan-out state. Created by [`Source::attach`], destroyed
/// (detached) on drop so a panicking or early-returning HTTP handler can
/// never leak a registration.
pub struct Consumer {
    id: u64,
    source: Arc<Source>,
    receiver: mpsc::Receiver<Arc<DataMessage>>,
    bytes_in_flight: Arc<AtomicUsize>,
    primed: PrimedState,
    scratch: [u8; 15],
    start_timestamp: Option<i64>,
    last_tag_size: u32,
    tags_written: u32,
    detached: bool,
}

impl Consumer {
    pub(crate) fn new(
        id: u64,
        source: Arc<Source>,
        receiver: mpsc::Receiver<Arc<DataMessage>>,
        bytes_in_flight: Arc<AtomicUsize>,
        primed: PrimedState,
    ) -> Self {
        Self {
            id,
            source,
            receiver,
            bytes_in_flight,
            primed,
            scratch: [0u8; 15],
            start_timestamp: None,
            last_tag_size: 0,
            tags_written: 0,
            detached: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Runs the HTTP-FLV response body: file header, primed metadata/config
    /// tags, then live tags until the source closes or `sink` errors.
    pub async fn live<S: FlvSink>(&mut self, sink: &mut S) -> Result<(), ConsumerError> {
        sink.write_all(Bytes::from_static(&FLV_FILE_HEADER)).await?;

        let Some(metadata) = self.primed.metadata.clone() else {
            return Err(ConsumerError::MetadataUnavailable);
        };
        self.write_tag(sink, TagType::ScriptData, 0, &metadata).await?;

        if let Some(audio) = self.primed.audio_config.clone() {
            self.write_tag(sink, TagType::Audio, audio.timestamp, &audio.payload).await?;
        }
        if let Some(video) = self.primed.video_config.clone() {
            self.write_tag(sink, TagType::Video, video.timestamp, &video.payload).await?;
        }

        while let Some(msg) = self.receiver.recv().await {
            let len = msg.payload.len();
            self.bytes_in_flight.fetch_sub(len, Ordering::Relaxed);

            let tag_type = match msg.kind {
                DataMessageKind::Audio => TagType::Audio,
                DataMessageKind::Video => TagType::Video,
                DataMessageKind::Amf0Data => TagType::ScriptData,
            };
            self.write_tag(sink, tag_type, msg.timestamp, &msg.payload).await?;
        }

        Ok(())
    }

    async fn write_tag<S: FlvSink>(&mut self, sink: &mut S, tag_type: TagType, timestamp: u32, payload: &[u8]) -> Result<(), ConsumerError> {
        let start = *self.start_timestamp.get_or_insert(timestamp as i64);
        let rebased = timestamp as i64 - start;
        let Ok(rebased) = u32::try_from(rebased) else {
            tracing::debug!(consumer_id = self.id, "skipping tag: rebased timestamp underflowed");
            return Ok(());
        };

        let header = TagHeader::compose(tag_type, payload.len(), rebased, self.last_tag_size)?;
        self.scratch = *header.as_bytes();
        self.last_tag_size = TagHeader::next_previous_tag_size(payload.len());

        if self.tags_written == 0 {
            // The file header already carries `PreviousTagSize0`; skip the
            // duplicate leading 4 bytes on the very first tag we emit.
            sink.write_all(Bytes::copy_from_slice(&self.scratch[4..])).await?;
        } else {
            sink.write_all(Bytes::copy_from_slice(&self.scratch)).await?;
        }
        sink.write_all(Bytes::copy_from_slice(payload)).await?;
        self.tags_written += 1;
        Ok(())
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        if !self.detached {
            self.detached = true;
            self.source.detach(self.id);
        }
    }
}
