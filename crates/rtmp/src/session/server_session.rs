use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tidalcast_amf0::Amf0Value;
use tidalcast_future_ext::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::define::{DEFAULT_WINDOW_ACK_SIZE, OutboundMessage, RtmpCommand, SessionState};
use super::errors::SessionError;
use super::sink::PublishSink;
use crate::chunk::{CHUNK_SIZE, ChunkDecoder, ChunkEncoder};
use crate::command_messages::{NetConnection, NetStream};
use crate::handshake::HandshakeServer;
use crate::messages::{DataMessage, DataMessageKind, MessageData};
use crate::user_control_messages::InboundUserControlEvent;
use crate::protocol_control_messages::{
    ProtocolControlMessageAcknowledgement, ProtocolControlMessageSetChunkSize, ProtocolControlMessageSetPeerBandwidth,
    ProtocolControlMessageSetPeerBandwidthLimitType, ProtocolControlMessageWindowAcknowledgementSize,
};
use crate::session::sink::MessageHandle;
use crate::user_control_messages::EventMessageStreamBegin;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_millis(2500);
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// One accepted connection, driven to completion by [`Session::run`].
///
/// Reading, chunk reassembly, command dispatch, and reply encoding all
/// happen on this single task: an accepted connection is handled by exactly
/// one peer, so there is nothing for a separate reader/writer task split to
/// buy beyond synchronization overhead (4.3.5 describes cooperating
/// inbound/outbound queues; [`super::define::InboundMessage`] and
/// [`OutboundMessage`] still carry that shape, they just get drained
/// in-line instead of across a channel).
pub struct Session<S> {
    io: S,
    read_buf: BytesMut,
    write_buf: Vec<u8>,
    chunk_decoder: ChunkDecoder,
    chunk_encoder: ChunkEncoder,
    state: SessionState,
    app_name: Option<String>,
    stream_id: u32,
    bytes_read: u32,
    bytes_acked_through: u32,
    message_handle: Option<Arc<dyn MessageHandle>>,
    terminal: bool,
}

impl<S> Session<S> {
    pub fn new(io: S) -> Self {
        Self {
            io,
            read_buf: BytesMut::with_capacity(CHUNK_SIZE * 4),
            write_buf: Vec::with_capacity(CHUNK_SIZE),
            chunk_decoder: ChunkDecoder::default(),
            chunk_encoder: ChunkEncoder::default(),
            state: SessionState::Connecting,
            app_name: None,
            stream_id: 0,
            bytes_read: 0,
            bytes_acked_through: 0,
            message_handle: None,
            terminal: false,
        }
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Drives the connection through the handshake and the publish session
    /// state machine until the client disconnects, issues a graceful
    /// unpublish, or a fatal protocol error occurs.
    ///
    /// `sink` is where completed audio/video/AMF0-data messages go once
    /// `publish` has been accepted; see [`PublishSink`].
    pub async fn run(&mut self, sink: &dyn PublishSink) -> Result<(), SessionError> {
        HandshakeServer::handshake(&mut self.io)
            .with_timeout(HANDSHAKE_TIMEOUT)
            .await
            .map_err(|_| SessionError::Timeout)??;

        self.write_outbound(OutboundMessage::SetChunkSize(CHUNK_SIZE as u32))?;
        self.flush().await?;

        while !self.terminal {
            if !self.read_and_dispatch(sink).await? {
                break;
            }
            self.flush().await?;
        }

        if let Some(handle) = self.message_handle.take() {
            handle.disconnect();
        }

        Ok(())
    }

    /// Reads one socket chunk's worth of data and processes every message it
    /// completes. Returns `false` on a clean EOF.
    async fn read_and_dispatch(&mut self, sink: &dyn PublishSink) -> Result<bool, SessionError> {
        self.read_buf.reserve(CHUNK_SIZE);
        let n = self
            .io
            .read_buf(&mut self.read_buf)
            .with_timeout(READ_TIMEOUT)
            .await
            .map_err(|_| SessionError::Timeout)??;

        if n == 0 {
            return Ok(false);
        }

        self.bytes_read = self.bytes_read.wrapping_add(n as u32);
        self.maybe_acknowledge()?;

        while let Some(chunk) = self.chunk_decoder.read_chunk(&mut self.read_buf)? {
            let stream_id = chunk.message_header.msg_stream_id;
            let timestamp = chunk.message_header.timestamp;
            if let Some(data) = MessageData::parse(&chunk)? {
                self.process_message(data, stream_id, timestamp, sink)?;
            }
        }

        Ok(true)
    }

    fn maybe_acknowledge(&mut self) -> Result<(), SessionError> {
        if self.bytes_read.wrapping_sub(self.bytes_acked_through) >= DEFAULT_WINDOW_ACK_SIZE {
            self.bytes_acked_through = self.bytes_read;
            self.write_outbound(OutboundMessage::Acknowledgement(self.bytes_read))?;
        }
        Ok(())
    }

    fn process_message(
        &mut self,
        data: MessageData,
        stream_id: u32,
        timestamp: u32,
        sink: &dyn PublishSink,
    ) -> Result<(), SessionError> {
        match data {
            MessageData::SetChunkSize(ProtocolControlMessageSetChunkSize { chunk_size }) => {
                if !self.chunk_decoder.update_max_chunk_size(chunk_size as usize) {
                    return Err(SessionError::InvalidChunkSize(chunk_size as usize));
                }
                Ok(())
            }
            MessageData::UserControlEvent(event) => self.on_user_control_event(event),
            MessageData::Amf0Command {
                command_name,
                transaction_id,
                command_object,
                others,
            } => self.on_command(stream_id, command_name, transaction_id, command_object, others, sink),
            MessageData::Amf0Data { data } => self.on_data_message(stream_id, DataMessageKind::Amf0Data, timestamp, data),
            MessageData::AudioData { data } => self.on_data_message(stream_id, DataMessageKind::Audio, timestamp, data),
            MessageData::VideoData { data } => self.on_data_message(stream_id, DataMessageKind::Video, timestamp, data),
        }
    }

    /// Neither event changes this publish-only server's behavior (there is
    /// no play client to size a buffer for, and this server never sends a
    /// `PingRequest` to get a response to), but both are logged rather than
    /// silently dropped now that the parser decodes them.
    fn on_user_control_event(&mut self, event: InboundUserControlEvent) -> Result<(), SessionError> {
        match event {
            InboundUserControlEvent::SetBufferLength { stream_id, buffer_length_ms } => {
                tracing::debug!(stream_id, buffer_length_ms, "ignoring SetBufferLength: no play client support");
            }
            InboundUserControlEvent::PingResponse { timestamp } => {
                tracing::trace!(timestamp, "received unsolicited ping response");
            }
        }
        Ok(())
    }

    fn on_data_message(
        &mut self,
        stream_id: u32,
        kind: DataMessageKind,
        timestamp: u32,
        payload: bytes::Bytes,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Publishing || stream_id != self.stream_id {
            return Err(SessionError::UnknownStreamId(stream_id));
        }

        let handle = self.message_handle.as_ref().ok_or(SessionError::UnknownStreamId(stream_id))?;
        handle.handle_message(Arc::new(DataMessage {
            kind,
            timestamp,
            stream_id,
            payload,
        }));
        Ok(())
    }

    fn on_command(
        &mut self,
        stream_id: u32,
        command_name: Amf0Value,
        transaction_id: Amf0Value,
        command_object: Amf0Value,
        others: Vec<Amf0Value>,
        sink: &dyn PublishSink,
    ) -> Result<(), SessionError> {
        let command = RtmpCommand::from(command_name.as_str().unwrap_or(""));
        let transaction_id = transaction_id.as_f64().unwrap_or(0.0);

        match command {
            RtmpCommand::Connect => self.on_connect(transaction_id, &command_object),
            RtmpCommand::ReleaseStream => self.write_outbound(OutboundMessage::ResultAck { transaction_id }),
            RtmpCommand::FcPublish => {
                self.write_outbound(OutboundMessage::ResultAck { transaction_id })?;
                self.write_outbound(OutboundMessage::OnFcPublish)
            }
            RtmpCommand::CreateStream => self.on_create_stream(transaction_id),
            RtmpCommand::Publish => self.on_publish(&others, sink),
            RtmpCommand::FcUnpublish | RtmpCommand::DeleteStream | RtmpCommand::Close => {
                self.terminal = true;
                self.state = SessionState::Terminal;
                if let Some(handle) = self.message_handle.take() {
                    handle.disconnect();
                }
                Ok(())
            }
            RtmpCommand::Play => Err(SessionError::PlayNotSupported),
            RtmpCommand::Call | RtmpCommand::Unknown(_) => {
                tracing::debug!(?stream_id, "ignoring unsupported command");
                Ok(())
            }
        }
    }

    fn on_connect(&mut self, transaction_id: f64, command_object: &Amf0Value) -> Result<(), SessionError> {
        let app = command_object.get("app").and_then(Amf0Value::as_str).ok_or(SessionError::NoAppName)?;
        self.app_name = Some(app.to_owned());

        self.write_outbound(OutboundMessage::WindowAckSize(DEFAULT_WINDOW_ACK_SIZE))?;
        self.write_outbound(OutboundMessage::SetPeerBandwidth(
            DEFAULT_WINDOW_ACK_SIZE,
            ProtocolControlMessageSetPeerBandwidthLimitType::Dynamic,
        ))?;
        self.write_outbound(OutboundMessage::ConnectResult { transaction_id })?;
        self.write_outbound(OutboundMessage::OnBwDone)?;

        self.state = SessionState::Connected;
        Ok(())
    }

    fn on_create_stream(&mut self, transaction_id: f64) -> Result<(), SessionError> {
        self.write_outbound(OutboundMessage::CreateStreamResult {
            transaction_id,
            stream_id: 1.0,
        })?;
        self.stream_id = 1;
        self.state = SessionState::StreamReady;
        Ok(())
    }

    fn on_publish(&mut self, others: &[Amf0Value], sink: &dyn PublishSink) -> Result<(), SessionError> {
        if self.state != SessionState::StreamReady {
            return Err(SessionError::PublishNotReady);
        }

        let stream_name = others.first().and_then(Amf0Value::as_str).ok_or(SessionError::NoStreamName)?;
        let app = self.app_name.as_deref().ok_or(SessionError::NoAppName)?;

        let handle = sink.publish(app, stream_name)?;
        self.message_handle = Some(handle);
        self.state = SessionState::Publishing;

        let stream_id = self.stream_id;
        self.write_outbound(OutboundMessage::StreamBegin { stream_id })?;
        self.write_outbound(OutboundMessage::OnStatus {
            msg_stream_id: stream_id,
            level: "status",
            code: "NetStream.Publish.Start",
            description: format!("Started publishing stream {stream_name}."),
        })
    }

    fn write_outbound(&mut self, msg: OutboundMessage) -> Result<(), SessionError> {
        match msg {
            OutboundMessage::SetChunkSize(size) => {
                ProtocolControlMessageSetChunkSize { chunk_size: size }.write(&self.chunk_encoder, &mut self.write_buf)?;
                self.chunk_encoder.set_chunk_size(size as usize);
            }
            OutboundMessage::WindowAckSize(size) => {
                ProtocolControlMessageWindowAcknowledgementSize {
                    acknowledgement_window_size: size,
                }
                .write(&self.chunk_encoder, &mut self.write_buf)?;
            }
            OutboundMessage::SetPeerBandwidth(size, limit_type) => {
                ProtocolControlMessageSetPeerBandwidth {
                    acknowledgement_window_size: size,
                    limit_type,
                }
                .write(&self.chunk_encoder, &mut self.write_buf)?;
            }
            OutboundMessage::Acknowledgement(sequence_number) => {
                ProtocolControlMessageAcknowledgement { sequence_number }.write(&self.chunk_encoder, &mut self.write_buf)?;
            }
            OutboundMessage::ConnectResult { transaction_id } => {
                NetConnection::write_connect_result(&self.chunk_encoder, &mut self.write_buf, transaction_id)?;
            }
            OutboundMessage::OnBwDone => {
                NetConnection::write_on_bw_done(&self.chunk_encoder, &mut self.write_buf)?;
            }
            OutboundMessage::ResultAck { transaction_id } => {
                NetConnection::write_result_ack(&self.chunk_encoder, &mut self.write_buf, transaction_id)?;
            }
            OutboundMessage::OnFcPublish => {
                NetConnection::write_on_fc_publish(&self.chunk_encoder, &mut self.write_buf)?;
            }
            OutboundMessage::CreateStreamResult { transaction_id, stream_id } => {
                NetConnection::write_create_stream_result(&self.chunk_encoder, &mut self.write_buf, transaction_id, stream_id)?;
            }
            OutboundMessage::StreamBegin { stream_id } => {
                EventMessageStreamBegin { stream_id }.write(&self.chunk_encoder, &mut self.write_buf)?;
            }
            OutboundMessage::OnStatus {
                msg_stream_id,
                level,
                code,
                description,
            } => {
                NetStream::write_on_status(&self.chunk_encoder, &mut self.write_buf, msg_stream_id, level, code, &description)?;
            }
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SessionError> {
        if self.write_buf.is_empty() {
            return Ok(());
        }

        self.io
            .write_all(&self.write_buf)
            .with_timeout(WRITE_TIMEOUT)
            .await
            .map_err(|_| SessionError::Timeout)??;
        self.write_buf.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tidalcast_amf0::Amf0Encoder;

    use super::*;
    use crate::chunk::{COMMAND_CHUNK_STREAM_ID, Chunk, ChunkEncoder as TestEncoder};
    use crate::messages::MessageTypeId;

    struct RecordingSink {
        published: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
            }
        }
    }

    impl PublishSink for RecordingSink {
        fn publish(&self, app: &str, stream: &str) -> Result<Arc<dyn MessageHandle>, super::super::sink::PublishSinkError> {
            self.published.lock().unwrap().push((app.to_owned(), stream.to_owned()));
            Ok(Arc::new(RecordingHandle::default()))
        }
    }

    #[derive(Default)]
    struct RecordingHandle {
        messages: Mutex<Vec<DataMessageKind>>,
        disconnected: Mutex<bool>,
    }

    impl MessageHandle for RecordingHandle {
        fn handle_message(&self, msg: Arc<DataMessage>) {
            self.messages.lock().unwrap().push(msg.kind);
        }

        fn disconnect(&self) {
            *self.disconnected.lock().unwrap() = true;
        }
    }

    fn command_chunk(command_name: &str, transaction_id: f64, command_object: Amf0Value, others: &[Amf0Value]) -> Vec<u8> {
        let mut values = vec![Amf0Value::string(command_name), Amf0Value::Number(transaction_id), command_object];
        values.extend_from_slice(others);

        let mut payload = Vec::new();
        Amf0Encoder::encode_all(&mut payload, &values).unwrap();

        let encoder = TestEncoder::default();
        let mut buf = Vec::new();
        encoder
            .write_chunk(&mut buf, Chunk::new(COMMAND_CHUNK_STREAM_ID, 0, MessageTypeId::CommandAmf0, 0, payload.into()))
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn full_publish_handshake_reaches_publishing_state() {
        let sink = RecordingSink::new();
        let (mut client, server) = tokio::io::duplex(1 << 16);
        let mut session = Session::new(server);

        let client_task = tokio::spawn(async move {
            let mut c0c1 = vec![0x03u8];
            c0c1.extend(vec![0; 1536]);
            client.write_all(&c0c1).await.unwrap();

            let mut s0s1s2 = vec![0u8; 1 + 1536 * 2];
            client.read_exact(&mut s0s1s2).await.unwrap();

            client.write_all(&vec![0u8; 1536]).await.unwrap();

            // Drain the post-handshake SetChunkSize.
            let mut drain = vec![0u8; 128];
            let _ = client.read(&mut drain).await.unwrap();

            let connect = command_chunk(
                "connect",
                1.0,
                Amf0Value::object([("app", Amf0Value::string("live"))]),
                &[],
            );
            client.write_all(&connect).await.unwrap();
            let mut drain = vec![0u8; 1024];
            let _ = client.read(&mut drain).await.unwrap();

            let create_stream = command_chunk("createStream", 2.0, Amf0Value::Null, &[]);
            client.write_all(&create_stream).await.unwrap();
            let mut drain = vec![0u8; 1024];
            let _ = client.read(&mut drain).await.unwrap();

            let publish = command_chunk(
                "publish",
                3.0,
                Amf0Value::Null,
                &[Amf0Value::string("test"), Amf0Value::string("live")],
            );
            client.write_all(&publish).await.unwrap();
            let mut drain = vec![0u8; 1024];
            let _ = client.read(&mut drain).await.unwrap();

            drop(client);
        });

        let _ = session.run(&sink).await;
        client_task.await.unwrap();

        assert_eq!(session.state, SessionState::Publishing);
        assert_eq!(sink.published.lock().unwrap().as_slice(), &[("live".to_owned(), "test".to_owned())]);
    }

    #[tokio::test]
    async fn rejects_play_as_unsupported() {
        let sink = RecordingSink::new();
        let mut session = Session::new(tokio::io::empty());
        session.state = SessionState::StreamReady;
        session.app_name = Some("live".to_owned());

        let err = session
            .on_command(
                1,
                Amf0Value::string("play"),
                Amf0Value::Number(4.0),
                Amf0Value::Null,
                vec![Amf0Value::string("test")],
                &sink,
            )
            .unwrap_err();

        assert!(matches!(err, SessionError::PlayNotSupported));
    }

    #[tokio::test]
    async fn data_message_outside_publishing_state_is_rejected() {
        let sink = RecordingSink::new();
        let mut session = Session::new(tokio::io::empty());

        let err = session.on_data_message(1, DataMessageKind::Video, 0, bytes::Bytes::new()).unwrap_err();
        assert!(matches!(err, SessionError::UnknownStreamId(1)));
        let _ = sink;
    }
}
