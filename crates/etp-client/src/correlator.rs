//! Request/response correlation.
//!
//! One pending slot per outbound request, keyed by its message id.  The
//! reader task appends reply bodies as they complete; the body carrying
//! FINAL (or a correlated `ProtocolException`) resolves the slot and hands
//! the ordered parts to the waiter through a oneshot.  Timeout and cancel
//! consume the slot atomically, so late frames find no slot and are
//! dropped with a warning by the caller.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use etp_proto::{EtpBody, MessageHeader};
use tokio::sync::oneshot;

use crate::error::ClientError;

/// Why a pending slot was resolved without a normal reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReplyError {
    Cancelled,
    ConnectionClosed,
    MessageTooLarge { message_id: i64 },
    /// The reply's discriminant is not in the dispatch table.
    UnknownMessageType { protocol: i32, message_type: i32 },
}

impl From<ReplyError> for ClientError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::Cancelled => ClientError::Cancelled,
            ReplyError::ConnectionClosed => ClientError::ConnectionClosed,
            ReplyError::MessageTooLarge { message_id } => {
                ClientError::MessageTooLarge { message_id }
            }
            ReplyError::UnknownMessageType { protocol, message_type } => {
                ClientError::Codec(etp_proto::CodecError::UnknownMessageType {
                    protocol,
                    message_type,
                })
            }
        }
    }
}

pub(crate) type ReplyResult = Result<Vec<EtpBody>, ReplyError>;

#[derive(Debug)]
struct Pending {
    parts: Vec<EtpBody>,
    tx: oneshot::Sender<ReplyResult>,
}

/// Allocates message ids and routes correlated replies to waiters.
///
/// Client message ids are even and strictly increasing; the store side of
/// the session allocates odd ids.
#[derive(Debug)]
pub(crate) struct Correlator {
    next_id: AtomicI64,
    pending: Mutex<HashMap<i64, Pending>>,
}

impl Correlator {
    pub(crate) fn new() -> Self {
        Self { next_id: AtomicI64::new(2), pending: Mutex::new(HashMap::new()) }
    }

    pub(crate) fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(2, Ordering::Relaxed)
    }

    /// Open a pending slot for a freshly allocated id.
    pub(crate) fn register(
        &self,
        message_id: i64,
    ) -> Result<oneshot::Receiver<ReplyResult>, ClientError> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.lock();
        if pending.contains_key(&message_id) {
            return Err(ClientError::DuplicateMessageId(message_id));
        }
        pending.insert(message_id, Pending { parts: Vec::new(), tx });
        Ok(rx)
    }

    /// Route one complete reply body to its waiter.
    ///
    /// Returns false when no slot is open for the correlation (late reply
    /// after timeout or cancel); the frame is the caller's to drop.
    pub(crate) fn deliver(&self, header: &MessageHeader, body: EtpBody) -> bool {
        let is_exception = matches!(body, EtpBody::ProtocolException(_));
        let mut pending = self.lock();
        let Some(slot) = pending.get_mut(&header.correlation_id) else {
            return false;
        };
        slot.parts.push(body);
        // A correlated exception replaces the reply and ends the stream.
        if header.is_final() || is_exception {
            if let Some(slot) = pending.remove(&header.correlation_id) {
                let _ = slot.tx.send(Ok(slot.parts));
            }
        }
        true
    }

    /// Wake one waiter with an error, consuming its slot.
    pub(crate) fn resolve_error(&self, message_id: i64, err: ReplyError) -> bool {
        match self.lock().remove(&message_id) {
            Some(slot) => {
                let _ = slot.tx.send(Err(err));
                true
            }
            None => false,
        }
    }

    /// Drop the slot without waking anyone (the waiter already gave up).
    pub(crate) fn forget(&self, message_id: i64) {
        self.lock().remove(&message_id);
    }

    /// Wake every waiter with the same error; used on session teardown.
    pub(crate) fn fail_all(&self, err: ReplyError) {
        for (_, slot) in self.lock().drain() {
            let _ = slot.tx.send(Err(err));
        }
    }

    /// Number of open pending slots.
    pub(crate) fn pending_len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Pending>> {
        self.pending.lock().expect("pending table lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use etp_proto::messages::core::{Pong, ProtocolException};
    use etp_proto::messages::dataspace::GetDataspacesResponse;
    use etp_proto::{MessageFlags, protocols};

    use super::*;

    fn reply_header(correlation_id: i64, final_flag: bool) -> MessageHeader {
        let flags = if final_flag { MessageFlags::FINAL } else { MessageFlags::NONE };
        MessageHeader::new(protocols::DATASPACE, 2, 1, correlation_id).with_flags(flags)
    }

    fn dataspaces_body() -> EtpBody {
        EtpBody::GetDataspacesResponse(GetDataspacesResponse { dataspaces: vec![] })
    }

    #[test]
    fn ids_are_even_and_strictly_increasing() {
        let correlator = Correlator::new();
        let mut previous = 0;
        for _ in 0..100 {
            let id = correlator.allocate_id();
            assert_eq!(id % 2, 0);
            assert!(id > previous);
            previous = id;
        }
    }

    #[test]
    fn concurrent_allocation_never_duplicates() {
        let correlator = Arc::new(Correlator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let correlator = Arc::clone(&correlator);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| correlator.allocate_id()).collect::<Vec<_>>()
            }));
        }
        let mut all: Vec<i64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        let len = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), len, "allocated ids must be unique");
    }

    #[tokio::test]
    async fn parts_accumulate_until_final_in_arrival_order() {
        let correlator = Correlator::new();
        let id = correlator.allocate_id();
        let rx = correlator.register(id).unwrap();

        assert!(correlator.deliver(&reply_header(id, false), dataspaces_body()));
        assert!(correlator.deliver(&reply_header(id, true), dataspaces_body()));

        let parts = rx.await.unwrap().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(correlator.pending_len(), 0);
    }

    #[tokio::test]
    async fn correlated_exception_resolves_the_slot_without_final() {
        let correlator = Correlator::new();
        let id = correlator.allocate_id();
        let rx = correlator.register(id).unwrap();

        let exception =
            EtpBody::ProtocolException(ProtocolException { code: 11, message: "Not Found".into() });
        assert!(correlator.deliver(&reply_header(id, false), exception.clone()));

        let parts = rx.await.unwrap().unwrap();
        assert_eq!(parts, vec![exception]);
        assert_eq!(correlator.pending_len(), 0);
    }

    #[tokio::test]
    async fn cancel_wakes_the_waiter_and_consumes_the_slot() {
        let correlator = Correlator::new();
        let id = correlator.allocate_id();
        let rx = correlator.register(id).unwrap();

        assert!(correlator.resolve_error(id, ReplyError::Cancelled));
        assert_eq!(rx.await.unwrap().unwrap_err(), ReplyError::Cancelled);

        // Late reply finds no slot.
        assert!(!correlator.deliver(&reply_header(id, true), dataspaces_body()));
        assert_eq!(correlator.pending_len(), 0);
    }

    #[tokio::test]
    async fn fail_all_wakes_every_waiter() {
        let correlator = Correlator::new();
        let a = correlator.allocate_id();
        let b = correlator.allocate_id();
        let rx_a = correlator.register(a).unwrap();
        let rx_b = correlator.register(b).unwrap();

        correlator.fail_all(ReplyError::ConnectionClosed);
        assert_eq!(rx_a.await.unwrap().unwrap_err(), ReplyError::ConnectionClosed);
        assert_eq!(rx_b.await.unwrap().unwrap_err(), ReplyError::ConnectionClosed);
        assert_eq!(correlator.pending_len(), 0);
    }

    #[test]
    fn duplicate_registration_is_an_invariant_violation() {
        let correlator = Correlator::new();
        let id = correlator.allocate_id();
        let _rx = correlator.register(id).unwrap();
        assert!(matches!(
            correlator.register(id),
            Err(ClientError::DuplicateMessageId(dup)) if dup == id
        ));
    }

    #[tokio::test]
    async fn replies_route_only_to_their_own_correlation() {
        let correlator = Correlator::new();
        let x = correlator.allocate_id();
        let y = correlator.allocate_id();
        let rx_x = correlator.register(x).unwrap();
        let rx_y = correlator.register(y).unwrap();

        // Server answers y first; each waiter sees exactly its own reply.
        let pong_y = EtpBody::Pong(Pong { current_date_time: 2 });
        let pong_x = EtpBody::Pong(Pong { current_date_time: 1 });
        assert!(correlator.deliver(&reply_header(y, true), pong_y.clone()));
        assert!(correlator.deliver(&reply_header(x, true), pong_x.clone()));

        assert_eq!(rx_x.await.unwrap().unwrap(), vec![pong_x]);
        assert_eq!(rx_y.await.unwrap().unwrap(), vec![pong_y]);
    }
}
