// mock_server: a mock ETP store for testing the client.
//
// Binds 127.0.0.1:0 (random port) and exposes the bound address; each
// test spins up its own isolated instance.  Accepts the session
// handshake, then answers requests from a scripted [`MockBehavior`].
//
// # Protocol behavior
//
// - `RequestSession` is answered with `OpenSession` correlated to it,
//   advertising 900 000-byte payload limits plus whatever the script
//   overrides.
// - `GetDataspaces` streams one `GetDataspacesResponse` per configured
//   dataspace, FINAL on the last, preserving script order.
// - `GetResources` consults the script: a configured failure produces a
//   correlated `ProtocolException`; a configured delay defers the reply
//   without blocking other requests on the same connection.
// - `Ping` is answered with a correlated `Pong` unless the script says to
//   stay silent (timeout tests).
// - Put operations are acknowledged with all-true success maps;
//   `PutDataSubarrays` bodies are additionally recorded for inspection.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use etp_proto::messages::DataValue;
use etp_proto::messages::core::{OpenSession, Pong, ProtocolException};
use etp_proto::messages::dataarray::{
    GetDataArrayMetadataResponse, GetDataArraysResponse, GetDataSubarraysResponse,
    PutDataArraysResponse, PutDataSubarraysResponse, PutDataSubarraysType,
};
use etp_proto::messages::dataspace::{
    Dataspace, DeleteDataspacesResponse, GetDataspacesResponse, PutDataspacesResponse,
};
use etp_proto::messages::discovery::{GetResourcesResponse, Resource};
use etp_proto::messages::store::{
    DataObject, DeleteDataObjectsResponse, GetDataObjectsResponse, PutDataObjectsResponse,
};
use etp_proto::messages::supported_types::GetSupportedTypesResponse;
use etp_proto::messages::transaction::{
    CommitTransactionResponse, RollbackTransactionResponse, StartTransactionResponse,
};
use etp_proto::{EtpBody, MessageFlags, MessageHeader, capabilities, codec, protocols};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::debug;
use uuid::Uuid;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// What the mock store should do, per scripted request.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Served by `GetDataspaces`, one response body each, in order.
    pub dataspaces: Vec<Dataspace>,
    /// `GetResources` results keyed by request URI.
    pub resources: HashMap<String, Vec<Resource>>,
    /// Delay (ms) before answering `GetResources` for a URI.
    pub resource_delay_ms: HashMap<String, u64>,
    /// `GetResources` URIs answered with a correlated exception.
    pub fail_resources: HashMap<String, (i32, String)>,
    /// Objects served by `GetDataObjects`, keyed by URI.
    pub data_objects: HashMap<String, DataObject>,
    /// Never answer `Ping` (timeout tests).
    pub silent_on_ping: bool,
    /// Never answer `RequestSession` (handshake-timeout tests).
    pub silent_on_handshake: bool,
    /// Advertise `MaxDataArraySize` in the handshake.
    pub max_data_array_size: Option<i64>,
}

/// A mock ETP server for integration testing.
pub struct MockEtpServer {
    addr: SocketAddr,
    put_subarrays: Arc<Mutex<Vec<PutDataSubarraysType>>>,
    /// Handle to the background accept loop; dropped with the server.
    _task: tokio::task::JoinHandle<()>,
}

impl MockEtpServer {
    /// Start the mock server, binding to a random available port.
    pub async fn start(behavior: MockBehavior) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let behavior = Arc::new(behavior);
        let put_subarrays = Arc::new(Mutex::new(Vec::new()));

        let recorder = Arc::clone(&put_subarrays);
        let task = tokio::spawn(async move {
            accept_loop(listener, behavior, recorder).await;
        });

        Ok(Self { addr, put_subarrays, _task: task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// `ws://` URL of the server.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Every `PutDataSubarraysType` received so far, in arrival order.
    pub fn recorded_put_subarrays(&self) -> Vec<PutDataSubarraysType> {
        self.put_subarrays.lock().expect("recorder lock poisoned").clone()
    }
}

async fn accept_loop(
    listener: TcpListener,
    behavior: Arc<MockBehavior>,
    recorder: Arc<Mutex<Vec<PutDataSubarraysType>>>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, _peer)) => {
                let behavior = Arc::clone(&behavior);
                let recorder = Arc::clone(&recorder);
                tokio::spawn(async move {
                    // Client drops are routine in tests; swallow errors.
                    let _ = handle_connection(stream, behavior, recorder).await;
                });
            }
            Err(_) => break,
        }
    }
}

struct Connection {
    behavior: Arc<MockBehavior>,
    recorder: Arc<Mutex<Vec<PutDataSubarraysType>>>,
    sink: Arc<tokio::sync::Mutex<WsSink>>,
    next_id: Arc<AtomicI64>,
}

impl Connection {
    /// Store-side message ids are odd.
    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(2, Ordering::Relaxed)
    }

    async fn send_replies(&self, correlation_id: i64, bodies: Vec<EtpBody>) {
        let last = bodies.len().saturating_sub(1);
        let mut sink = self.sink.lock().await;
        for (index, body) in bodies.into_iter().enumerate() {
            let (protocol, message_type) = body.discriminant();
            let flags = if index == last { MessageFlags::FINAL } else { MessageFlags::NONE };
            let header = MessageHeader {
                protocol,
                message_type,
                correlation_id,
                message_id: self.allocate_id(),
                message_flags: flags,
            };
            match codec::encode_message(&header, &body) {
                Ok(frame) => {
                    let _ = sink.send(Message::Binary(frame.into())).await;
                }
                Err(e) => debug!(error = %e, "mock reply encode failed"),
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    behavior: Arc<MockBehavior>,
    recorder: Arc<Mutex<Vec<PutDataSubarraysType>>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (sink, mut read) = ws.split();
    let connection = Arc::new(Connection {
        behavior,
        recorder,
        sink: Arc::new(tokio::sync::Mutex::new(sink)),
        next_id: Arc::new(AtomicI64::new(1)),
    });

    // Byte-level reassembly by sender message id, then operation-level
    // accumulation until a FINAL body (chunked puts span several bodies).
    let mut partial: HashMap<i64, Vec<u8>> = HashMap::new();
    let mut operations: HashMap<i64, Vec<EtpBody>> = HashMap::new();

    while let Some(frame) = read.next().await {
        let bytes = match frame? {
            Message::Binary(bytes) => bytes,
            Message::Ping(payload) => {
                let _ = connection.sink.lock().await.send(Message::Pong(payload)).await;
                continue;
            }
            Message::Close(_) => break,
            _ => continue,
        };

        let mut reader = &bytes[..];
        let header = codec::decode_header(&mut reader)?;
        let payload = reader;

        let is_chunk = header.protocol == protocols::STORE
            && header.message_type == etp_proto::messages::store::msg::CHUNK;
        let body_bytes: Vec<u8> = if header.is_multipart() && !is_chunk {
            partial.entry(header.message_id).or_default().extend_from_slice(payload);
            continue;
        } else {
            let mut buffer = partial.remove(&header.message_id).unwrap_or_default();
            buffer.extend_from_slice(payload);
            buffer
        };

        let body = codec::decode_body(header.protocol, header.message_type, &body_bytes)?;
        let mut parts = operations.remove(&header.message_id).unwrap_or_default();
        parts.push(body);
        if !header.is_final() {
            operations.insert(header.message_id, parts);
            continue;
        }

        if !dispatch(&connection, header.message_id, parts).await {
            break;
        }
    }

    Ok(())
}

/// Answer one complete operation.  Returns false to close the connection.
async fn dispatch(connection: &Arc<Connection>, request_id: i64, parts: Vec<EtpBody>) -> bool {
    let behavior = &connection.behavior;
    let Some(first) = parts.first().cloned() else {
        return true;
    };

    match first {
        EtpBody::RequestSession(request) => {
            if behavior.silent_on_handshake {
                return true;
            }
            let mut caps = std::collections::BTreeMap::from([
                (
                    capabilities::MAX_WEB_SOCKET_FRAME_PAYLOAD_SIZE.to_owned(),
                    DataValue::Long(capabilities::DEFAULT_PAYLOAD_SIZE),
                ),
                (
                    capabilities::MAX_WEB_SOCKET_MESSAGE_PAYLOAD_SIZE.to_owned(),
                    DataValue::Long(capabilities::DEFAULT_PAYLOAD_SIZE),
                ),
            ]);
            if let Some(size) = behavior.max_data_array_size {
                caps.insert(capabilities::MAX_DATA_ARRAY_SIZE.to_owned(), DataValue::Long(size));
            }
            let open = EtpBody::OpenSession(OpenSession {
                application_name: "mock-etp-store".to_owned(),
                application_version: "1.0".to_owned(),
                server_instance_id: Uuid::new_v4(),
                supported_protocols: request.requested_protocols.clone(),
                supported_formats: vec!["xml".to_owned()],
                session_id: Uuid::new_v4(),
                current_date_time: request.current_date_time,
                endpoint_capabilities: caps,
            });
            connection.send_replies(request_id, vec![open]).await;
        }
        EtpBody::CloseSession(_) => return false,
        EtpBody::Ping(ping) => {
            if !behavior.silent_on_ping {
                let pong = EtpBody::Pong(Pong { current_date_time: ping.current_date_time });
                connection.send_replies(request_id, vec![pong]).await;
            }
        }
        EtpBody::GetDataspaces(_) => {
            let bodies: Vec<EtpBody> = if behavior.dataspaces.is_empty() {
                vec![EtpBody::GetDataspacesResponse(GetDataspacesResponse { dataspaces: vec![] })]
            } else {
                behavior
                    .dataspaces
                    .iter()
                    .map(|dataspace| {
                        EtpBody::GetDataspacesResponse(GetDataspacesResponse {
                            dataspaces: vec![dataspace.clone()],
                        })
                    })
                    .collect()
            };
            connection.send_replies(request_id, bodies).await;
        }
        EtpBody::PutDataspaces(put) => {
            let success = put.dataspaces.keys().map(|k| (k.clone(), true)).collect();
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::PutDataspacesResponse(PutDataspacesResponse { success })],
                )
                .await;
        }
        EtpBody::DeleteDataspaces(delete) => {
            let success = delete.uris.keys().map(|k| (k.clone(), true)).collect();
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::DeleteDataspacesResponse(DeleteDataspacesResponse { success })],
                )
                .await;
        }
        EtpBody::GetResources(request) => {
            let uri = request.uri.clone();
            if let Some((code, message)) = behavior.fail_resources.get(&uri) {
                let exception = EtpBody::ProtocolException(ProtocolException {
                    code: *code,
                    message: message.clone(),
                });
                connection.send_replies(request_id, vec![exception]).await;
                return true;
            }
            let resources = behavior.resources.get(&uri).cloned().unwrap_or_default();
            let reply =
                EtpBody::GetResourcesResponse(GetResourcesResponse { resources });
            match behavior.resource_delay_ms.get(&uri).copied() {
                Some(delay_ms) if delay_ms > 0 => {
                    // Answer later without holding up the read loop.
                    let connection = Arc::clone(connection);
                    tokio::spawn(async move {
                        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                        connection.send_replies(request_id, vec![reply]).await;
                    });
                }
                _ => connection.send_replies(request_id, vec![reply]).await,
            }
        }
        EtpBody::GetSupportedTypes(_) => {
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::GetSupportedTypesResponse(GetSupportedTypesResponse {
                        supported_types: vec![],
                    })],
                )
                .await;
        }
        EtpBody::GetDataObjects(request) => {
            let data_objects = request
                .uris
                .iter()
                .filter_map(|(key, uri)| {
                    behavior.data_objects.get(uri).map(|object| (key.clone(), object.clone()))
                })
                .collect();
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::GetDataObjectsResponse(GetDataObjectsResponse { data_objects })],
                )
                .await;
        }
        EtpBody::PutDataObjects(put) => {
            // Chunk parts were accumulated with the put; ack the objects.
            let success = put.data_objects.keys().map(|k| (k.clone(), true)).collect();
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::PutDataObjectsResponse(PutDataObjectsResponse { success })],
                )
                .await;
        }
        EtpBody::DeleteDataObjects(delete) => {
            let success = delete.uris.keys().map(|k| (k.clone(), true)).collect();
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::DeleteDataObjectsResponse(DeleteDataObjectsResponse { success })],
                )
                .await;
        }
        EtpBody::PutDataArrays(put) => {
            let success = put.data_arrays.keys().map(|k| (k.clone(), true)).collect();
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::PutDataArraysResponse(PutDataArraysResponse { success })],
                )
                .await;
        }
        EtpBody::PutDataSubarrays(put) => {
            {
                let mut recorded = connection.recorder.lock().expect("recorder lock poisoned");
                recorded.extend(put.data_subarrays.values().cloned());
            }
            let success = put.data_subarrays.keys().map(|k| (k.clone(), true)).collect();
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::PutDataSubarraysResponse(PutDataSubarraysResponse { success })],
                )
                .await;
        }
        EtpBody::GetDataArrays(_) => {
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::GetDataArraysResponse(GetDataArraysResponse {
                        data_arrays: std::collections::BTreeMap::new(),
                    })],
                )
                .await;
        }
        EtpBody::GetDataSubarrays(_) => {
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::GetDataSubarraysResponse(GetDataSubarraysResponse {
                        data_subarrays: std::collections::BTreeMap::new(),
                    })],
                )
                .await;
        }
        EtpBody::GetDataArrayMetadata(_) => {
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::GetDataArrayMetadataResponse(GetDataArrayMetadataResponse {
                        array_metadata: std::collections::BTreeMap::new(),
                    })],
                )
                .await;
        }
        EtpBody::StartTransaction(_) => {
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::StartTransactionResponse(StartTransactionResponse {
                        transaction_uuid: Uuid::new_v4(),
                        successful: true,
                        failure_reason: String::new(),
                    })],
                )
                .await;
        }
        EtpBody::CommitTransaction(commit) => {
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::CommitTransactionResponse(CommitTransactionResponse {
                        transaction_uuid: commit.transaction_uuid,
                        successful: true,
                        failure_reason: String::new(),
                    })],
                )
                .await;
        }
        EtpBody::RollbackTransaction(rollback) => {
            connection
                .send_replies(
                    request_id,
                    vec![EtpBody::RollbackTransactionResponse(RollbackTransactionResponse {
                        transaction_uuid: rollback.transaction_uuid,
                        successful: true,
                        failure_reason: String::new(),
                    })],
                )
                .await;
        }
        other => {
            let exception = EtpBody::ProtocolException(ProtocolException {
                code: 3,
                message: format!("mock store does not implement {}", other.name()),
            });
            connection.send_replies(request_id, vec![exception]).await;
        }
    }
    true
}
