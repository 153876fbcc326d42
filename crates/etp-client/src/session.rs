//! Session state, negotiated capabilities, and the connection task.
//!
//! One spawned task owns the WebSocket: it forwards pre-encoded outbound
//! frames, reassembles inbound frames into logical messages, answers
//! keep-alives, drives the handshake state machine, and routes correlated
//! replies to their waiters.  Everything else talks to it through
//! channels.

use std::sync::{Arc, RwLock};

use etp_proto::messages::DataValueMap;
use etp_proto::messages::core::{CloseSession, Pong};
use etp_proto::{EtpBody, MessageFlags, MessageHeader, capabilities, codec};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::correlator::{Correlator, ReplyError};
use crate::error::ClientError;
use crate::events::{EventBus, SessionEvent};
use crate::framing::{Inbound, Reassembler, split_message};
use crate::transport::WsStream;

type WsSink = futures_util::stream::SplitSink<WsStream, Message>;

/// Connection lifecycle.  Transitions are one-way; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Connecting,
    Handshaking,
    Active,
    Closed,
}

/// Capabilities in force for the session.
///
/// Starts from the client's advertised values; [`absorb`] applies the
/// server's (possibly reduced) set from `OpenSession`.  A peer value of 0
/// or an absent key keeps the previous value.
///
/// [`absorb`]: SessionCapabilities::absorb
#[derive(Debug, Clone)]
pub struct SessionCapabilities {
    pub max_ws_frame_payload_size: i64,
    pub max_ws_message_payload_size: i64,
    pub max_data_array_size: i64,
    pub max_data_object_size: i64,
    pub supports_alterable_metadata: bool,
    pub session_id: Option<Uuid>,
}

impl Default for SessionCapabilities {
    fn default() -> Self {
        Self {
            max_ws_frame_payload_size: capabilities::DEFAULT_PAYLOAD_SIZE,
            max_ws_message_payload_size: capabilities::DEFAULT_PAYLOAD_SIZE,
            max_data_array_size: i64::MAX,
            max_data_object_size: i64::MAX,
            supports_alterable_metadata: false,
            session_id: None,
        }
    }
}

impl SessionCapabilities {
    pub(crate) fn absorb(&mut self, peer: &DataValueMap) {
        let take = |key: &str| peer.get(key).and_then(|v| v.as_long()).filter(|v| *v > 0);
        if let Some(v) = take(capabilities::MAX_WEB_SOCKET_FRAME_PAYLOAD_SIZE) {
            self.max_ws_frame_payload_size = v;
        }
        if let Some(v) = take(capabilities::MAX_WEB_SOCKET_MESSAGE_PAYLOAD_SIZE) {
            self.max_ws_message_payload_size = v;
        }
        if let Some(v) = take(capabilities::MAX_DATA_ARRAY_SIZE) {
            self.max_data_array_size = v;
        }
        if let Some(v) = take(capabilities::MAX_DATA_OBJECT_SIZE) {
            self.max_data_object_size = v;
        }
        if let Some(v) = peer
            .get(capabilities::SUPPORTS_ALTERABLE_METADATA)
            .and_then(etp_proto::messages::DataValue::as_bool)
        {
            self.supports_alterable_metadata = v;
        }
    }
}

/// State shared between the facade and the connection task.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) correlator: Correlator,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) events: EventBus,
    pub(crate) capabilities: RwLock<SessionCapabilities>,
    pub(crate) outbound: mpsc::Sender<Vec<Message>>,
    pub(crate) shutdown: watch::Sender<bool>,
}

impl Shared {
    pub(crate) fn state_now(&self) -> SessionState {
        *self.state.borrow()
    }

    /// One-way transition; regressions (and transitions out of `Closed`)
    /// are ignored.
    pub(crate) fn transition(&self, to: SessionState) {
        self.state.send_if_modified(|state| {
            if to > *state {
                *state = to;
                true
            } else {
                false
            }
        });
    }

    pub(crate) fn capabilities_snapshot(&self) -> SessionCapabilities {
        self.capabilities.read().expect("capabilities lock poisoned").clone()
    }

    fn absorb_capabilities(&self, peer: &DataValueMap, session_id: Uuid) {
        let mut caps = self.capabilities.write().expect("capabilities lock poisoned");
        caps.absorb(peer);
        caps.session_id = Some(session_id);
    }

    /// Encode the bodies of one logical outbound message into wire frames.
    ///
    /// All bodies share `message_id`; each carries its given flags, and a
    /// body too large for one frame is byte-split.
    pub(crate) fn encode_frames(
        &self,
        message_id: i64,
        correlation_id: i64,
        bodies: &[(EtpBody, MessageFlags)],
    ) -> Result<Vec<Message>, ClientError> {
        let max_frame = usize::try_from(self.capabilities_snapshot().max_ws_frame_payload_size)
            .unwrap_or(usize::MAX);
        let mut frames = Vec::new();
        for (body, flags) in bodies {
            let (protocol, message_type) = body.discriminant();
            let header = MessageHeader {
                protocol,
                message_type,
                correlation_id,
                message_id,
                message_flags: *flags,
            };
            let encoded = codec::encode_body(body)?;
            for bytes in split_message(header, &encoded, max_frame)? {
                frames.push(Message::Binary(bytes));
            }
        }
        Ok(frames)
    }

    pub(crate) async fn send_frames(&self, frames: Vec<Message>) -> Result<(), ClientError> {
        self.outbound.send(frames).await.map_err(|_| ClientError::ConnectionClosed)
    }
}

/// Why the connection loop ended.
enum CloseCause {
    LocalClose,
    PeerClose { code: Option<u16>, reason: String },
    Transport(String),
    Fatal(String),
}

/// What the dispatcher wants the loop to do next.
enum Action {
    Continue,
    Reply(Message),
    Close(CloseCause),
}

pub(crate) struct ConnectionTask {
    pub(crate) ws: WsStream,
    pub(crate) outbound_rx: mpsc::Receiver<Vec<Message>>,
    pub(crate) shared: Arc<Shared>,
}

impl ConnectionTask {
    pub(crate) async fn run(self) {
        let ConnectionTask { ws, mut outbound_rx, shared } = self;
        let (mut write, mut read) = ws.split();
        let mut shutdown_rx = shared.shutdown.subscribe();
        let mut reassembler = Reassembler::new(
            usize::try_from(shared.capabilities_snapshot().max_ws_message_payload_size)
                .unwrap_or(usize::MAX),
        );

        let cause = 'session: loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        send_close_session(&shared, &mut write).await;
                        break 'session CloseCause::LocalClose;
                    }
                }
                frames = outbound_rx.recv() => {
                    match frames {
                        None => break 'session CloseCause::LocalClose,
                        Some(frames) => {
                            // Frames of one logical message stay contiguous.
                            for frame in frames {
                                if let Err(e) = write.send(frame).await {
                                    break 'session CloseCause::Transport(e.to_string());
                                }
                            }
                        }
                    }
                }
                inbound = read.next() => {
                    match inbound {
                        None => break 'session CloseCause::PeerClose {
                            code: None,
                            reason: "stream ended".to_owned(),
                        },
                        Some(Err(e)) => break 'session CloseCause::Transport(e.to_string()),
                        Some(Ok(Message::Binary(bytes))) => {
                            match handle_frame(&shared, &mut reassembler, &bytes) {
                                Action::Continue => {}
                                Action::Reply(reply) => {
                                    if let Err(e) = write.send(reply).await {
                                        break 'session CloseCause::Transport(e.to_string());
                                    }
                                }
                                Action::Close(cause) => break 'session cause,
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = write.send(Message::Pong(payload)).await;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = match frame {
                                Some(frame) => {
                                    (Some(u16::from(frame.code)), frame.reason.as_str().to_owned())
                                }
                                None => (None, String::new()),
                            };
                            break 'session CloseCause::PeerClose { code, reason };
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        };

        finalize(&shared, cause);
        let _ = write.close().await;
    }
}

/// Decode and dispatch one inbound WebSocket frame.
fn handle_frame(shared: &Shared, reassembler: &mut Reassembler, bytes: &[u8]) -> Action {
    let (header, body_bytes) = match reassembler.push(bytes) {
        Ok(Inbound::Complete { header, body }) => (header, body),
        Ok(Inbound::Pending) => return Action::Continue,
        Ok(Inbound::TooLarge { message_id, correlation_id }) => {
            warn!(message_id, correlation_id, "dropping reassembly over the negotiated limit");
            if correlation_id == 0
                || !shared
                    .correlator
                    .resolve_error(correlation_id, ReplyError::MessageTooLarge { message_id })
            {
                warn!(message_id, "oversized message had no waiter");
            }
            return Action::Continue;
        }
        Err(e) => {
            // A frame whose header cannot be decoded poisons the stream.
            return Action::Close(CloseCause::Fatal(format!("undecodable frame: {e}")));
        }
    };

    let body = match codec::decode_body(header.protocol, header.message_type, &body_bytes) {
        Ok(body) => body,
        Err(etp_proto::CodecError::UnknownMessageType { protocol, message_type }) => {
            warn!(protocol, message_type, "unknown message type");
            if header.correlation_id != 0 {
                let _ = shared.correlator.resolve_error(
                    header.correlation_id,
                    ReplyError::UnknownMessageType { protocol, message_type },
                );
            }
            return Action::Continue;
        }
        Err(e) => return Action::Close(CloseCause::Fatal(format!("body decode: {e}"))),
    };

    shared.events.publish(SessionEvent::Message { header });
    debug!(
        message_id = header.message_id,
        correlation_id = header.correlation_id,
        body = body.name(),
        "message"
    );

    match body {
        EtpBody::OpenSession(open) => {
            shared.absorb_capabilities(&open.endpoint_capabilities, open.session_id);
            let caps = shared.capabilities_snapshot();
            reassembler
                .set_limit(usize::try_from(caps.max_ws_message_payload_size).unwrap_or(usize::MAX));
            shared.transition(SessionState::Active);
            info!(
                session_id = %open.session_id,
                application = %open.application_name,
                "session open"
            );
            Action::Continue
        }
        EtpBody::CloseSession(close) => Action::Close(CloseCause::PeerClose {
            code: None,
            reason: close.reason,
        }),
        EtpBody::Ping(ping) if header.correlation_id == 0 => {
            // Server-initiated keep-alive; answer with our clock.
            let pong = EtpBody::Pong(Pong { current_date_time: ping.current_date_time });
            let reply_header = MessageHeader::new(
                etp_proto::protocols::CORE,
                etp_proto::messages::core::msg::PONG,
                shared.correlator.allocate_id(),
                header.message_id,
            );
            match codec::encode_message(&reply_header, &pong) {
                Ok(frame) => Action::Reply(Message::Binary(frame.into())),
                Err(e) => Action::Close(CloseCause::Fatal(format!("pong encode: {e}"))),
            }
        }
        EtpBody::ProtocolException(exception) if header.correlation_id == 0 => {
            Action::Close(CloseCause::Fatal(format!(
                "uncorrelated protocol exception {}: {}",
                exception.code, exception.message
            )))
        }
        body if header.correlation_id != 0 => {
            if !shared.correlator.deliver(&header, body) {
                warn!(
                    correlation_id = header.correlation_id,
                    "late reply with no pending request, dropping"
                );
            }
            Action::Continue
        }
        body => {
            debug!(body = body.name(), "ignoring unsolicited message");
            Action::Continue
        }
    }
}

async fn send_close_session(shared: &Shared, write: &mut WsSink) {
    let header = MessageHeader::new(
        etp_proto::protocols::CORE,
        etp_proto::messages::core::msg::CLOSE_SESSION,
        shared.correlator.allocate_id(),
        0,
    );
    let body = EtpBody::CloseSession(CloseSession { reason: "client closing".to_owned() });
    if let Ok(frame) = codec::encode_message(&header, &body) {
        let _ = write.send(Message::Binary(frame.into())).await;
    }
}

fn finalize(shared: &Shared, cause: CloseCause) {
    match cause {
        CloseCause::LocalClose => {
            info!("session closed by client");
            shared.events.publish(SessionEvent::Close { code: None, reason: "client close".to_owned() });
        }
        CloseCause::PeerClose { code, reason } => {
            info!(?code, reason = %reason, "session closed by peer");
            shared.events.publish(SessionEvent::Close { code, reason });
        }
        CloseCause::Transport(message) => {
            warn!(error = %message, "transport failure");
            shared.events.publish(SessionEvent::Error { message });
        }
        CloseCause::Fatal(message) => {
            warn!(error = %message, "fatal protocol error");
            shared.events.publish(SessionEvent::Error { message });
        }
    }
    shared.transition(SessionState::Closed);
    shared.correlator.fail_all(ReplyError::ConnectionClosed);
    shared.events.publish(SessionEvent::Stop);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use etp_proto::messages::DataValue;

    use super::*;

    #[test]
    fn absorb_takes_positive_peer_values_only() {
        let mut caps = SessionCapabilities::default();
        caps.absorb(&BTreeMap::from([
            ("MaxWebSocketFramePayloadSize".to_owned(), DataValue::Long(400_000)),
            ("MaxWebSocketMessagePayloadSize".to_owned(), DataValue::Long(0)),
            ("MaxDataArraySize".to_owned(), DataValue::Long(250_000)),
            ("SupportsAlterableMetadata".to_owned(), DataValue::Boolean(true)),
        ]));
        assert_eq!(caps.max_ws_frame_payload_size, 400_000);
        // 0 means "not advertised": the conservative default stays.
        assert_eq!(caps.max_ws_message_payload_size, capabilities::DEFAULT_PAYLOAD_SIZE);
        assert_eq!(caps.max_data_array_size, 250_000);
        assert!(caps.supports_alterable_metadata);
    }

    #[test]
    fn transitions_are_one_way() {
        let (state, _) = watch::channel(SessionState::Connecting);
        let (outbound, _outbound_rx) = mpsc::channel(1);
        let (shutdown, _) = watch::channel(false);
        let shared = Shared {
            correlator: Correlator::new(),
            state,
            events: EventBus::new(),
            capabilities: RwLock::new(SessionCapabilities::default()),
            outbound,
            shutdown,
        };
        shared.transition(SessionState::Handshaking);
        shared.transition(SessionState::Active);
        assert_eq!(shared.state_now(), SessionState::Active);
        shared.transition(SessionState::Handshaking);
        assert_eq!(shared.state_now(), SessionState::Active, "no regressions");
        shared.transition(SessionState::Closed);
        shared.transition(SessionState::Active);
        assert_eq!(shared.state_now(), SessionState::Closed, "Closed is terminal");
    }
}
