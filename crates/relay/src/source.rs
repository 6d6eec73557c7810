use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::RwLock;
use tidalcast_rtmp::messages::{DataMessage, DataMessageKind};
use tokio::sync::mpsc;

use crate::consumer::{Consumer, ConsumerLimits, ConsumerSlot, PrimedState};
use crate::error::ConsumerError;

/// A named live stream: one publisher, any number of attached consumers.
///
/// Mirrors 4.4.2: a consumer list guarded by a reader/writer lock (walked
/// under a read lock by [`Source::handle_message`], mutated under a write
/// lock by attach/detach), plus the cached priming state every newly
/// attached consumer replays before its first live tag.
pub struct Source {
    key: String,
    state: RwLock<SourceState>,
    consumers: RwLock<HashMap<u64, ConsumerSlot>>,
    next_consumer_id: AtomicU64,
    sequence: AtomicU64,
    closed: AtomicBool,
}

#[derive(Default)]
struct SourceState {
    metadata: Option<Bytes>,
    audio_config: Option<Arc<DataMessage>>,
    video_config: Option<Arc<DataMessage>>,
}

impl Source {
    pub(crate) fn new(key: String) -> Arc<Self> {
        Arc::new(Self {
            key,
            state: RwLock::new(SourceState::default()),
            consumers: RwLock::new(HashMap::new()),
            next_consumer_id: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Called from the publisher's receiver task only (5's concurrency
    /// model). Latches metadata/audio/video priming state the first time
    /// each is seen, then fans `msg` out to every currently attached
    /// consumer under a read lock.
    pub fn handle_message(self: &Arc<Self>, msg: Arc<DataMessage>) {
        self.sequence.fetch_add(1, Ordering::Relaxed);
        self.maybe_prime(&msg);

        let consumers = self.consumers.read();
        for slot in consumers.values() {
            slot.offer(&msg);
        }
    }

    fn maybe_prime(&self, msg: &Arc<DataMessage>) {
        let mut state = self.state.write();

        if state.metadata.is_none() && msg.kind == DataMessageKind::Amf0Data && msg.stream_id == 0 && msg.timestamp == 0 {
            if let Some(primed) = tidalcast_flv::prime_metadata(&msg.payload) {
                state.metadata = Some(primed);
            }
        }

        if state.audio_config.is_none() && msg.kind == DataMessageKind::Audio && is_audio_sequence_header(&msg.payload) {
            state.audio_config = Some(Arc::clone(msg));
        }

        if state.video_config.is_none() && msg.kind == DataMessageKind::Video && is_video_sequence_header(&msg.payload) {
            state.video_config = Some(Arc::clone(msg));
        }
    }

    /// Registers a new consumer and returns its fan-out handle, primed with
    /// whatever metadata/config this source has cached so far.
    pub fn attach(self: &Arc<Self>, limits: ConsumerLimits) -> Result<Consumer, ConsumerError> {
        let id = self.next_consumer_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(limits.max_len.max(1));
        let bytes_in_flight = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let slot = ConsumerSlot::new(id, tx, Arc::clone(&bytes_in_flight), limits.max_size);

        // The closed-check and the insert must happen under the same
        // `consumers` write-lock critical section `close()` uses, or a
        // `close()` that runs between the two would clear the map before
        // this consumer lands in it and never clear it again (its channel
        // sender would then live forever, and `Consumer::live` would hang).
        {
            let mut consumers = self.consumers.write();
            if self.is_closed() {
                return Err(ConsumerError::Closed);
            }
            consumers.insert(id, slot);
        }

        let primed = {
            let state = self.state.read();
            PrimedState {
                metadata: state.metadata.clone(),
                audio_config: state.audio_config.clone(),
                video_config: state.video_config.clone(),
            }
        };

        Ok(Consumer::new(id, Arc::clone(self), rx, bytes_in_flight, primed))
    }

    /// Removes a consumer by id. Idempotent: a double-detach (drop racing a
    /// source-wide close) is a harmless no-op on the second call.
    pub fn detach(&self, id: u64) {
        self.consumers.write().remove(&id);
    }

    /// Marks the source closed and drops every attached consumer's sender,
    /// which closes each consumer's channel and unblocks its `live` loop.
    /// Idempotent.
    pub fn close(&self) {
        let mut consumers = self.consumers.write();
        if self.closed.swap(true, Ordering::Relaxed) {
            return;
        }
        consumers.clear();
    }
}

/// AAC sequence header: `SoundFormat == 10` (AAC) and `AACPacketType == 0`.
fn is_audio_sequence_header(payload: &[u8]) -> bool {
    payload.len() >= 2 && (payload[0] >> 4) == 10 && payload[1] == 0
}

/// AVC sequence header: `CodecID == 7` (AVC) and `AVCPacketType == 0`.
fn is_video_sequence_header(payload: &[u8]) -> bool {
    payload.len() >= 2 && (payload[0] & 0x0F) == 7 && payload[1] == 0
}

#[cfg(test)]
mod tests {
    use tidalcast_amf0::{Amf0Encoder, Amf0Value};

    use super::*;

    fn data_message(kind: DataMessageKind, stream_id: u32, timestamp: u32, payload: Vec<u8>) -> Arc<DataMessage> {
        Arc::new(DataMessage {
            kind,
            timestamp,
            stream_id,
            payload: payload.into(),
        })
    }

    fn metadata_payload() -> Vec<u8> {
        let mut payload = Vec::new();
        Amf0Encoder::encode_all(
            &mut payload,
            &[
                Amf0Value::string("@setDataFrame"),
                Amf0Value::string("onMetaData"),
                Amf0Value::object([("width", Amf0Value::Number(640.0))]),
            ],
        )
        .unwrap();
        payload
    }

    #[test]
    fn primes_metadata_from_first_data_message() {
        let source = Source::new("live/s1".to_owned());
        let msg = data_message(DataMessageKind::Amf0Data, 0, 0, metadata_payload());
        source.handle_message(msg);

        let primed = source.state.read().metadata.clone().unwrap();
        let mut expected = Vec::new();
        Amf0Encoder::encode_all(
            &mut expected,
            &[
                Amf0Value::string("onMetaData"),
                Amf0Value::object([("width", Amf0Value::Number(640.0))]),
            ],
        )
        .unwrap();
        assert_eq!(primed, expected);
    }

    #[test]
    fn rejects_metadata_with_non_string_leading_value() {
        let source = Source::new("live/s1".to_owned());
        let mut payload = Vec::new();
        Amf0Encoder::encode_all(&mut payload, &[Amf0Value::Number(1.0)]).unwrap();
        source.handle_message(data_message(DataMessageKind::Amf0Data, 0, 0, payload));

        assert!(source.state.read().metadata.is_none());
    }

    #[test]
    fn ignores_data_message_off_stream_zero() {
        let source = Source::new("live/s1".to_owned());
        source.handle_message(data_message(DataMessageKind::Amf0Data, 1, 0, metadata_payload()));
        assert!(source.state.read().metadata.is_none());
    }

    #[test]
    fn detects_and_latches_audio_config() {
        let source = Source::new("live/s1".to_owned());
        let seq_header = data_message(DataMessageKind::Audio, 1, 0, vec![0xAF, 0x00, 0x12, 0x34]);
        source.handle_message(Arc::clone(&seq_header));

        let cached = source.state.read().audio_config.clone().unwrap();
        assert_eq!(cached.payload, seq_header.payload);

        // A later, different sequence header does not replace the cached one.
        source.handle_message(data_message(DataMessageKind::Audio, 1, 10, vec![0xAF, 0x00, 0xFF, 0xFF]));
        assert_eq!(source.state.read().audio_config.clone().unwrap().payload, seq_header.payload);
    }

    #[test]
    fn attaching_to_closed_source_fails() {
        let source = Source::new("live/s1".to_owned());
        source.close();
        assert!(matches!(source.attach(ConsumerLimits::default()), Err(ConsumerError::Closed)));
    }

    #[test]
    fn close_is_idempotent_and_clears_consumers() {
        let source = Source::new("live/s1".to_owned());
        let _consumer = source.attach(ConsumerLimits::default()).unwrap();
        assert_eq!(source.consumers.read().len(), 1);

        source.close();
        source.close();
        assert_eq!(source.consumers.read().len(), 0);
        assert!(source.is_closed());
    }
}
