//! The client facade.
//!
//! [`EtpClient::connect`] opens the WebSocket, spawns the connection task,
//! and drives the `RequestSession`/`OpenSession` handshake.  Facade
//! methods build requests through the protocol handlers, wait on the
//! correlator, and return an [`Outcome`]: the typed reply, or the server's
//! `ProtocolException` as a value.  Only timeouts, cancellation, and
//! transport faults travel the error channel.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use etp_proto::arrays::AnyArray;
use etp_proto::messages::ActiveStatusKind;
use etp_proto::messages::core::{AuthorizeResponse, Pong};
use etp_proto::messages::dataarray::{DataArray, DataArrayMetadata};
use etp_proto::messages::dataspace::Dataspace;
use etp_proto::messages::discovery::{GetResources, Resource};
use etp_proto::messages::store::DataObject;
use etp_proto::messages::supported_types::SupportedType;
use etp_proto::messages::transaction::{
    CommitTransactionResponse, RollbackTransactionResponse, StartTransactionResponse,
};
use etp_proto::{CodecError, EtpBody, MessageFlags, uri};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::info;
use uuid::Uuid;

use crate::auth::TokenError;
use crate::chunking::{self, SubarrayWindow};
use crate::config::{DataspaceAcl, EtpConfig};
use crate::correlator::{Correlator, ReplyError};
use crate::error::{ClientError, Outcome};
use crate::events::{EventBus, SessionEvent};
use crate::handlers;
use crate::handlers::discovery::DiscoveryResult;
use crate::session::{ConnectionTask, SessionCapabilities, SessionState, Shared};
use crate::transport;

const OUTBOUND_CHANNEL_CAPACITY: usize = 32;
/// Headroom left in a frame for the chunk envelope around its payload.
const CHUNK_ENVELOPE_SLACK: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    Idle,
    /// A start is in flight; a second start must fail locally.
    Starting,
    Active(Uuid),
}

/// An ETP v1.2 client session.
///
/// Cheap to clone; clones share the connection.
#[derive(Debug, Clone)]
pub struct EtpClient {
    shared: Arc<Shared>,
    config: Arc<EtpConfig>,
    transaction: Arc<Mutex<TransactionState>>,
}

impl EtpClient {
    /// Connect, authenticate, and complete the session handshake.
    ///
    /// Fails with [`ClientError::HandshakeTimeout`] when the server does
    /// not answer `RequestSession` within `config.handshake_timeout`.
    pub async fn connect(config: EtpConfig) -> Result<Self, ClientError> {
        let events = EventBus::new();
        events.publish(SessionEvent::Start);

        let ws = transport::connect_websocket(&config).await?;
        events.publish(SessionEvent::Open);
        info!(url = %config.url, "websocket open, requesting session");

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        let (state_tx, _) = watch::channel(SessionState::Handshaking);
        let (shutdown_tx, _) = watch::channel(false);
        let capabilities = SessionCapabilities {
            max_ws_frame_payload_size: config.max_ws_frame_payload_size,
            max_ws_message_payload_size: config.max_ws_message_payload_size,
            ..SessionCapabilities::default()
        };
        let shared = Arc::new(Shared {
            correlator: Correlator::new(),
            state: state_tx,
            events,
            capabilities: RwLock::new(capabilities),
            outbound: outbound_tx,
            shutdown: shutdown_tx,
        });
        tokio::spawn(ConnectionTask { ws, outbound_rx, shared: Arc::clone(&shared) }.run());

        let client = EtpClient {
            shared,
            config: Arc::new(config),
            transaction: Arc::new(Mutex::new(TransactionState::Idle)),
        };

        // OpenSession is handled by the session layer, not the correlator,
        // so the handshake request goes out without a pending slot.
        let message_id = client.shared.correlator.allocate_id();
        let request = handlers::core::request_session(&client.config, Uuid::new_v4());
        let frames =
            client.shared.encode_frames(message_id, 0, &[(request, MessageFlags::FINAL)])?;
        client.shared.send_frames(frames).await?;

        let mut state_rx = client.shared.state.subscribe();
        let opened = tokio::time::timeout(
            client.config.handshake_timeout,
            state_rx.wait_for(|s| matches!(s, SessionState::Active | SessionState::Closed)),
        )
        .await;
        match opened {
            Err(_elapsed) => {
                let _ = client.shared.shutdown.send(true);
                Err(ClientError::HandshakeTimeout)
            }
            Ok(Err(_)) => Err(ClientError::ConnectionClosed),
            Ok(Ok(state)) if *state == SessionState::Active => {
                drop(state);
                Ok(client)
            }
            Ok(Ok(_)) => Err(ClientError::ConnectionClosed),
        }
    }

    /// Load the config from a TOML file and connect.
    pub async fn connect_from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        Self::connect(EtpConfig::load(path)?).await
    }

    pub fn is_connected(&self) -> bool {
        self.shared.state_now() == SessionState::Active
    }

    pub fn state(&self) -> SessionState {
        self.shared.state_now()
    }

    /// Capabilities in force for the session (post-handshake values).
    pub fn capabilities(&self) -> SessionCapabilities {
        self.shared.capabilities_snapshot()
    }

    /// Subscribe to lifecycle events; unsubscribe by dropping the receiver.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Number of requests currently awaiting a reply.
    pub fn pending_requests(&self) -> usize {
        self.shared.correlator.pending_len()
    }

    /// Close the session and wait briefly for the connection task to wind
    /// down.  All pending waiters are woken with `ConnectionClosed`.
    pub async fn close(&self) {
        let _ = self.shared.shutdown.send(true);
        let mut state_rx = self.shared.state.subscribe();
        let _ = tokio::time::timeout(
            Duration::from_secs(2),
            state_rx.wait_for(|s| *s == SessionState::Closed),
        )
        .await;
    }

    // -----------------------------------------------------------------------
    // Correlator surface
    // -----------------------------------------------------------------------

    /// Send one message without waiting; returns its message id.
    pub async fn send(&self, body: EtpBody) -> Result<i64, ClientError> {
        self.ensure_active()?;
        let message_id = self.shared.correlator.allocate_id();
        let frames =
            self.shared.encode_frames(message_id, 0, &[(body, MessageFlags::FINAL)])?;
        self.shared.send_frames(frames).await?;
        Ok(message_id)
    }

    /// Send one message and wait for its complete correlated reply.
    ///
    /// Returns the ordered list of reply bodies (a multipart reply yields
    /// several).  On timeout the pending slot is removed and late frames
    /// are discarded.
    pub async fn send_and_wait(
        &self,
        body: EtpBody,
        timeout: Option<Duration>,
    ) -> Result<Vec<EtpBody>, ClientError> {
        self.send_bodies_and_wait(vec![(body, MessageFlags::FINAL)], timeout).await
    }

    /// Wake the waiter for `message_id` with `Cancelled`.
    ///
    /// The transport is not notified; the reply, if it ever arrives, is
    /// dropped.  Returns false when nothing was pending under that id.
    pub fn cancel(&self, message_id: i64) -> bool {
        self.shared.correlator.resolve_error(message_id, ReplyError::Cancelled)
    }

    async fn send_bodies_and_wait(
        &self,
        bodies: Vec<(EtpBody, MessageFlags)>,
        timeout: Option<Duration>,
    ) -> Result<Vec<EtpBody>, ClientError> {
        self.ensure_active()?;
        let message_id = self.shared.correlator.allocate_id();
        let reply_rx = self.shared.correlator.register(message_id)?;

        let frames = match self.shared.encode_frames(message_id, 0, &bodies) {
            Ok(frames) => frames,
            Err(e) => {
                self.shared.correlator.forget(message_id);
                return Err(e);
            }
        };
        if let Err(e) = self.shared.send_frames(frames).await {
            self.shared.correlator.forget(message_id);
            return Err(e);
        }

        let timeout = timeout.unwrap_or(self.config.request_timeout);
        match tokio::time::timeout(timeout, reply_rx).await {
            Err(_elapsed) => {
                self.shared.correlator.forget(message_id);
                Err(ClientError::Timeout)
            }
            Ok(Err(_sender_dropped)) => Err(ClientError::ConnectionClosed),
            Ok(Ok(Ok(parts))) => Ok(parts),
            Ok(Ok(Err(reply_error))) => Err(reply_error.into()),
        }
    }

    fn ensure_active(&self) -> Result<(), ClientError> {
        match self.shared.state_now() {
            SessionState::Active => Ok(()),
            _ => Err(ClientError::NotConnected),
        }
    }

    // -----------------------------------------------------------------------
    // Core
    // -----------------------------------------------------------------------

    pub async fn ping(&self, timeout: Option<Duration>) -> Result<Outcome<Pong>, ClientError> {
        let parts = self.send_and_wait(handlers::core::ping_request(), timeout).await?;
        handlers::core::collect_pong(parts)
    }

    /// Re-authorize the session in place (e.g. after a token renewal).
    pub async fn authorize(
        &self,
        authorization: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<AuthorizeResponse>, ClientError> {
        let authorization = match authorization {
            Some(value) => value,
            None => self
                .config
                .credentials
                .authorization_header()?
                .ok_or_else(|| TokenError("no credentials configured".to_owned()))?,
        };
        let request = handlers::core::authorize_request(authorization, BTreeMap::new());
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::core::collect_authorize(parts)
    }

    // -----------------------------------------------------------------------
    // Dataspace
    // -----------------------------------------------------------------------

    pub async fn get_dataspaces(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Outcome<Vec<Dataspace>>, ClientError> {
        let parts =
            self.send_and_wait(handlers::dataspace::get_dataspaces_request(None), timeout).await?;
        handlers::dataspace::collect_dataspaces(parts)
    }

    pub async fn put_dataspaces<S: AsRef<str>>(
        &self,
        names: impl IntoIterator<Item = S>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
        let request = handlers::dataspace::put_dataspaces_request(names, None);
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::dataspace::collect_put_success(parts)
    }

    /// Put dataspaces carrying an ACL: the one given, or the config
    /// default when `None`.
    pub async fn put_dataspaces_with_acl<S: AsRef<str>>(
        &self,
        names: impl IntoIterator<Item = S>,
        acl: Option<&DataspaceAcl>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
        let acl = acl.or(self.config.default_acl.as_ref());
        let request = handlers::dataspace::put_dataspaces_request(names, acl);
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::dataspace::collect_put_success(parts)
    }

    pub async fn delete_dataspaces<S: AsRef<str>>(
        &self,
        names: impl IntoIterator<Item = S>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
        let request = handlers::dataspace::delete_dataspaces_request(names);
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::dataspace::collect_delete_success(parts)
    }

    // -----------------------------------------------------------------------
    // Discovery / SupportedTypes
    // -----------------------------------------------------------------------

    /// Discover the direct members of a dataspace (or of the store root).
    pub async fn get_resources(
        &self,
        uri: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<Vec<Resource>>, ClientError> {
        let request = handlers::discovery::get_resources_request(uri, 1);
        let parts = self.send_and_wait(request, timeout).await?;
        Ok(handlers::discovery::collect_resources(parts)?.map(|result| result.resources))
    }

    /// Run a fully specified discovery query, edges included.
    pub async fn get_resources_with(
        &self,
        request: GetResources,
        timeout: Option<Duration>,
    ) -> Result<Outcome<DiscoveryResult>, ClientError> {
        let request = handlers::discovery::get_resources_request_with(request);
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::discovery::collect_resources(parts)
    }

    pub async fn get_supported_types(
        &self,
        uri: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<Vec<SupportedType>>, ClientError> {
        let request = handlers::supported_types::get_supported_types_request(uri);
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::supported_types::collect_supported_types(parts)
    }

    // -----------------------------------------------------------------------
    // Store
    // -----------------------------------------------------------------------

    pub async fn get_data_objects<S: AsRef<str>>(
        &self,
        uris: impl IntoIterator<Item = S>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, DataObject>>, ClientError> {
        let request = handlers::store::get_data_objects_request(uri::uri_map(uris), "xml");
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::store::collect_data_objects(parts)
    }

    /// Fetch a single object by URI.
    pub async fn get_data_object(
        &self,
        uri: &str,
        timeout: Option<Duration>,
    ) -> Result<Outcome<Option<DataObject>>, ClientError> {
        Ok(self
            .get_data_objects([uri], timeout)
            .await?
            .map(|mut objects| objects.remove("0")))
    }

    /// Put objects, chunking any body above the negotiated object size.
    pub async fn put_data_objects(
        &self,
        objects: Vec<DataObject>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
        let keyed: BTreeMap<String, DataObject> = objects
            .into_iter()
            .enumerate()
            .map(|(index, object)| (index.to_string(), object))
            .collect();
        let bodies = handlers::store::put_data_objects_bodies(keyed, self.chunk_budget());
        let parts = self.send_bodies_and_wait(bodies, timeout).await?;
        handlers::store::collect_put_success(parts)
    }

    /// Put one object from an in-memory XML or JSON body.
    pub async fn put_data_object_str(
        &self,
        uri: &str,
        title: &str,
        content: &str,
        format: &str,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
        let now = handlers::now_micros();
        let object = DataObject {
            resource: Resource {
                uri: uri::canonical_uri(Some(uri)),
                name: title.to_owned(),
                source_count: None,
                target_count: None,
                last_changed: now,
                store_last_write: now,
                active_status: ActiveStatusKind::Active,
            },
            format: format.to_owned(),
            blob_id: None,
            data: content.as_bytes().to_vec(),
        };
        self.put_data_objects(vec![object], timeout).await
    }

    /// Put one object read from disk; chunked when large.
    pub async fn put_data_object_file(
        &self,
        path: impl AsRef<Path>,
        uri: &str,
        title: &str,
        format: &str,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ClientError::Transport(format!("object file: {e}")))?;
        self.put_data_object_str(uri, title, &content, format, timeout).await
    }

    pub async fn delete_data_objects<S: AsRef<str>>(
        &self,
        uris: impl IntoIterator<Item = S>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
        let request = handlers::store::delete_data_objects_request(uri::uri_map(uris));
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::store::collect_delete_success(parts)
    }

    /// Chunk payload budget: bounded by the negotiated object size and by
    /// what fits in one frame beside the chunk envelope.
    fn chunk_budget(&self) -> usize {
        let caps = self.capabilities();
        let frame_budget = usize::try_from(caps.max_ws_frame_payload_size)
            .unwrap_or(usize::MAX)
            .saturating_sub(CHUNK_ENVELOPE_SLACK);
        usize::try_from(caps.max_data_object_size)
            .unwrap_or(usize::MAX)
            .min(frame_budget)
            .max(1)
    }

    // -----------------------------------------------------------------------
    // DataArray
    // -----------------------------------------------------------------------

    pub async fn get_data_array_metadata(
        &self,
        uri: &str,
        path_in_resource: &str,
        timeout: Option<Duration>,
    ) -> Result<Outcome<Option<DataArrayMetadata>>, ClientError> {
        let uid = handlers::dataarray::identifier(uri, path_in_resource);
        let parts =
            self.send_and_wait(handlers::dataarray::get_metadata_request(uid), timeout).await?;
        handlers::dataarray::collect_metadata(parts)
    }

    /// Fetch a whole array, tiling the transfer when it exceeds the
    /// negotiated `MaxDataArraySize`.
    pub async fn get_data_array(
        &self,
        uri: &str,
        path_in_resource: &str,
        timeout: Option<Duration>,
    ) -> Result<Outcome<Option<DataArray>>, ClientError> {
        let metadata = match self.get_data_array_metadata(uri, path_in_resource, timeout).await? {
            Outcome::Rejected(exception) => return Ok(Outcome::Rejected(exception)),
            Outcome::Value(None) => return Ok(Outcome::Value(None)),
            Outcome::Value(Some(metadata)) => metadata,
        };

        let uid = handlers::dataarray::identifier(uri, path_in_resource);
        let total: i64 = metadata.dimensions.iter().product();
        if total <= self.capabilities().max_data_array_size {
            let parts =
                self.send_and_wait(handlers::dataarray::get_data_arrays_request(uid), timeout).await?;
            return handlers::dataarray::collect_data_array(parts);
        }

        // Tiled fetch: one GetDataSubarrays per window, stitched back into
        // one flat buffer.
        let windows =
            chunking::tile_windows(&metadata.dimensions, self.capabilities().max_data_array_size);
        let mut tiles: Vec<(SubarrayWindow, AnyArray)> = Vec::with_capacity(windows.len());
        for window in windows {
            let request = handlers::dataarray::get_subarray_request(uid.clone(), &window);
            let parts = self.send_and_wait(request, timeout).await?;
            match handlers::dataarray::collect_subarray(parts)? {
                Outcome::Rejected(exception) => return Ok(Outcome::Rejected(exception)),
                Outcome::Value(None) => {
                    return Err(CodecError::Format(
                        "store returned no subarray for a window".to_owned(),
                    )
                    .into());
                }
                Outcome::Value(Some(tile)) => tiles.push((window, tile.data)),
            }
        }
        let data = chunking::stitch_windows(&metadata.dimensions, tiles)?;
        Ok(Outcome::Value(Some(DataArray { dimensions: metadata.dimensions, data })))
    }

    pub async fn get_data_subarray(
        &self,
        uri: &str,
        path_in_resource: &str,
        starts: Vec<i64>,
        counts: Vec<i64>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<Option<DataArray>>, ClientError> {
        let uid = handlers::dataarray::identifier(uri, path_in_resource);
        let window = SubarrayWindow { starts, counts };
        let request = handlers::dataarray::get_subarray_request(uid, &window);
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::dataarray::collect_subarray(parts)
    }

    /// Put a whole array, splitting into row-major subarray windows when
    /// it exceeds the negotiated `MaxDataArraySize`.
    ///
    /// Returns the per-item success map; for a tiled put the keys are the
    /// tile indices in emission order.
    pub async fn put_data_array(
        &self,
        uri: &str,
        path_in_resource: &str,
        data: AnyArray,
        dimensions: Vec<i64>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
        let total: i64 = dimensions.iter().product();
        if i64::try_from(data.len()).unwrap_or(i64::MAX) != total {
            return Err(
                CodecError::Format("array length does not match its dimensions".to_owned()).into()
            );
        }

        let uid = handlers::dataarray::identifier(uri, path_in_resource);
        let max_elements = self.capabilities().max_data_array_size;
        if total <= max_elements {
            let request = handlers::dataarray::put_data_arrays_request(
                uid,
                DataArray { dimensions, data },
            );
            let parts = self.send_and_wait(request, timeout).await?;
            return handlers::dataarray::collect_put_success(parts);
        }

        let windows = chunking::tile_windows(&dimensions, max_elements);
        let mut success = BTreeMap::new();
        for (index, window) in windows.iter().enumerate() {
            let offset = usize::try_from(window.flat_offset(&dimensions)).unwrap_or(0);
            let len = usize::try_from(window.element_count()).unwrap_or(0);
            let tile = data.slice(offset, len);
            let request = handlers::dataarray::put_subarray_request(uid.clone(), tile, window);
            let parts = self.send_and_wait(request, timeout).await?;
            match handlers::dataarray::collect_put_subarray_success(parts)? {
                Outcome::Rejected(exception) => return Ok(Outcome::Rejected(exception)),
                Outcome::Value(acks) => {
                    success.insert(index.to_string(), acks.values().all(|ok| *ok));
                }
            }
        }
        Ok(Outcome::Value(success))
    }

    pub async fn put_data_subarray(
        &self,
        uri: &str,
        path_in_resource: &str,
        data: AnyArray,
        starts: Vec<i64>,
        counts: Vec<i64>,
        timeout: Option<Duration>,
    ) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
        let uid = handlers::dataarray::identifier(uri, path_in_resource);
        let window = SubarrayWindow { starts, counts };
        let request = handlers::dataarray::put_subarray_request(uid, data, &window);
        let parts = self.send_and_wait(request, timeout).await?;
        handlers::dataarray::collect_put_subarray_success(parts)
    }

    // -----------------------------------------------------------------------
    // Transaction
    // -----------------------------------------------------------------------

    /// The uuid of the transaction this session currently holds, if any.
    pub fn active_transaction(&self) -> Option<Uuid> {
        match *self.transaction_lock() {
            TransactionState::Active(uuid) => Some(uuid),
            _ => None,
        }
    }

    /// Start a server transaction over the given dataspaces.
    ///
    /// At most one transaction per session: a second start fails locally
    /// with [`ClientError::TransactionAlreadyActive`] and sends nothing.
    pub async fn start_transaction<S: AsRef<str>>(
        &self,
        dataspaces: impl IntoIterator<Item = S>,
        read_only: bool,
        timeout: Option<Duration>,
    ) -> Result<Outcome<StartTransactionResponse>, ClientError> {
        {
            let mut transaction = self.transaction_lock();
            if *transaction != TransactionState::Idle {
                return Err(ClientError::TransactionAlreadyActive);
            }
            *transaction = TransactionState::Starting;
        }

        let request = handlers::transaction::start_transaction_request(dataspaces, read_only);
        let result = async {
            let parts = self.send_and_wait(request, timeout).await?;
            handlers::transaction::collect_start(parts)
        }
        .await;

        let mut transaction = self.transaction_lock();
        match &result {
            Ok(Outcome::Value(response)) if response.successful => {
                *transaction = TransactionState::Active(response.transaction_uuid);
            }
            _ => *transaction = TransactionState::Idle,
        }
        result
    }

    /// Commit the session's transaction.  The local handle is cleared once
    /// the server answers; on timeout it stays held so the caller can
    /// retry or roll back.
    pub async fn commit_transaction(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Outcome<CommitTransactionResponse>, ClientError> {
        let uuid = self.require_transaction()?;
        let request = handlers::transaction::commit_transaction_request(uuid);
        let parts = self.send_and_wait(request, timeout).await?;
        let outcome = handlers::transaction::collect_commit(parts)?;
        *self.transaction_lock() = TransactionState::Idle;
        Ok(outcome)
    }

    /// Roll back the session's transaction; clears the local handle once
    /// the server answers.
    pub async fn rollback_transaction(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Outcome<RollbackTransactionResponse>, ClientError> {
        let uuid = self.require_transaction()?;
        let request = handlers::transaction::rollback_transaction_request(uuid);
        let parts = self.send_and_wait(request, timeout).await?;
        let outcome = handlers::transaction::collect_rollback(parts)?;
        *self.transaction_lock() = TransactionState::Idle;
        Ok(outcome)
    }

    fn require_transaction(&self) -> Result<Uuid, ClientError> {
        match *self.transaction_lock() {
            TransactionState::Active(uuid) => Ok(uuid),
            _ => Err(ClientError::NoActiveTransaction),
        }
    }

    fn transaction_lock(&self) -> std::sync::MutexGuard<'_, TransactionState> {
        self.transaction.lock().expect("transaction lock poisoned")
    }
}
