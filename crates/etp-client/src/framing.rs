//! Frame splitting and reassembly.
//!
//! Outbound: a body whose Avro datum exceeds the peer's
//! `MaxWebSocketFramePayloadSize` is split into byte slices; every slice is
//! prefixed with a header sharing the message id and correlation id, frames
//! `1..n-1` carry MULTIPART, and frame `n` carries the message's logical
//! flags (normally FINAL).  Exactly one frame of any logical message has
//! FINAL set.
//!
//! Inbound: frames carrying MULTIPART are buffered by sender message id;
//! a frame without MULTIPART completes its message.  `Chunk` frames are
//! exempt: the chunking handler bounds their payloads below the frame
//! limit, so a `Chunk` is always a self-contained message and its
//! MULTIPART bit only marks membership in a chunked store operation.
//!
//! Reassembly is capped by the peer's `MaxWebSocketMessagePayloadSize`;
//! an oversized message is dropped whole and surfaced as `MessageTooLarge`
//! correlated to the offending message id.

use std::collections::HashMap;

use bytes::Bytes;
use etp_proto::messages::store;
use etp_proto::{CodecError, MessageFlags, MessageHeader, codec, protocols};

/// Split one encoded body into wire frames.
///
/// `header` carries the message's logical flags; intermediate frames get
/// MULTIPART instead.
pub(crate) fn split_message(
    header: MessageHeader,
    body: &[u8],
    max_frame_payload: usize,
) -> Result<Vec<Bytes>, CodecError> {
    let max_frame_payload = max_frame_payload.max(1);
    let chunk_count = body.len().div_ceil(max_frame_payload).max(1);
    let mut frames = Vec::with_capacity(chunk_count);
    for (index, slice) in body.chunks(max_frame_payload).enumerate() {
        let last = index == chunk_count - 1;
        let flags = if last { header.message_flags } else { MessageFlags::MULTIPART };
        let mut frame = codec::encode_header(&header.with_flags(flags))?;
        frame.extend_from_slice(slice);
        frames.push(Bytes::from(frame));
    }
    if frames.is_empty() {
        // Empty body still travels as one frame.
        frames.push(Bytes::from(codec::encode_header(&header)?));
    }
    Ok(frames)
}

/// Outcome of feeding one inbound frame to the reassembler.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// A logical message is complete; `body` is the full body datum.
    Complete { header: MessageHeader, body: Bytes },
    /// The frame was buffered; more frames of its message follow.
    Pending,
    /// The in-progress message outgrew the negotiated limit and was
    /// dropped.  `correlation_id` routes the error to the waiter.
    TooLarge { message_id: i64, correlation_id: i64 },
}

struct Partial {
    buffer: Vec<u8>,
}

/// Inbound frame buffer, owned by the reader task.
pub(crate) struct Reassembler {
    max_message_payload: usize,
    partial: HashMap<i64, Partial>,
}

impl Reassembler {
    pub(crate) fn new(max_message_payload: usize) -> Self {
        Self { max_message_payload, partial: HashMap::new() }
    }

    /// Adopt the limit negotiated in the handshake.
    pub(crate) fn set_limit(&mut self, max_message_payload: usize) {
        self.max_message_payload = max_message_payload;
    }

    pub(crate) fn push(&mut self, frame: &[u8]) -> Result<Inbound, CodecError> {
        let mut reader = frame;
        let header = codec::decode_header(&mut reader)?;
        let payload = reader;

        let is_chunk =
            header.protocol == protocols::STORE && header.message_type == store::msg::CHUNK;

        if header.is_multipart() && !is_chunk {
            let partial = self
                .partial
                .entry(header.message_id)
                .or_insert_with(|| Partial { buffer: Vec::new() });
            if partial.buffer.len() + payload.len() > self.max_message_payload {
                self.partial.remove(&header.message_id);
                return Ok(Inbound::TooLarge {
                    message_id: header.message_id,
                    correlation_id: header.correlation_id,
                });
            }
            partial.buffer.extend_from_slice(payload);
            return Ok(Inbound::Pending);
        }

        let body = match self.partial.remove(&header.message_id) {
            Some(mut partial) => {
                if partial.buffer.len() + payload.len() > self.max_message_payload {
                    return Ok(Inbound::TooLarge {
                        message_id: header.message_id,
                        correlation_id: header.correlation_id,
                    });
                }
                partial.buffer.extend_from_slice(payload);
                Bytes::from(partial.buffer)
            }
            None => Bytes::copy_from_slice(payload),
        };
        Ok(Inbound::Complete { header, body })
    }

    /// Number of messages currently mid-reassembly.
    #[cfg(test)]
    fn in_progress(&self) -> usize {
        self.partial.len()
    }
}

#[cfg(test)]
mod tests {
    use etp_proto::EtpBody;
    use etp_proto::messages::core::Ping;
    use proptest::prelude::*;

    use super::*;

    fn header(message_id: i64) -> MessageHeader {
        MessageHeader::new(0, 8, message_id, 0)
    }

    fn reassemble(frames: &[Bytes], reassembler: &mut Reassembler) -> (MessageHeader, Bytes) {
        for (i, frame) in frames.iter().enumerate() {
            match reassembler.push(frame).unwrap() {
                Inbound::Pending => assert!(i < frames.len() - 1, "last frame must complete"),
                Inbound::Complete { header, body } => {
                    assert_eq!(i, frames.len() - 1, "only the last frame completes");
                    return (header, body);
                }
                Inbound::TooLarge { .. } => panic!("unexpected TooLarge"),
            }
        }
        panic!("message never completed");
    }

    #[test]
    fn small_message_is_a_single_final_frame() {
        let frames = split_message(header(2), &[1, 2, 3], 900_000).unwrap();
        assert_eq!(frames.len(), 1);
        let mut reassembler = Reassembler::new(900_000);
        let (decoded, body) = reassemble(&frames, &mut reassembler);
        assert!(decoded.is_final());
        assert_eq!(&body[..], &[1, 2, 3]);
    }

    #[test]
    fn split_emits_ceil_len_over_max_frames_with_one_final() {
        let body: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        let frames = split_message(header(4), &body, 1000).unwrap();
        assert_eq!(frames.len(), 3);

        let mut finals = 0;
        for frame in &frames {
            let mut reader = &frame[..];
            let decoded = codec::decode_header(&mut reader).unwrap();
            assert_eq!(decoded.message_id, 4);
            if decoded.is_final() {
                finals += 1;
            } else {
                assert!(decoded.is_multipart());
            }
        }
        assert_eq!(finals, 1, "exactly one frame carries FINAL");

        let mut reassembler = Reassembler::new(900_000);
        let (_, reassembled) = reassemble(&frames, &mut reassembler);
        assert_eq!(&reassembled[..], &body[..], "reassembly is byte-identical");
        assert_eq!(reassembler.in_progress(), 0);
    }

    #[test]
    fn interleaved_message_ids_reassemble_independently() {
        let body_a: Vec<u8> = vec![0xaa; 1500];
        let body_b: Vec<u8> = vec![0xbb; 1500];
        let frames_a = split_message(header(2), &body_a, 1000).unwrap();
        let frames_b = split_message(header(4), &body_b, 1000).unwrap();

        let mut reassembler = Reassembler::new(900_000);
        assert!(matches!(reassembler.push(&frames_a[0]).unwrap(), Inbound::Pending));
        assert!(matches!(reassembler.push(&frames_b[0]).unwrap(), Inbound::Pending));
        let Inbound::Complete { header: ha, body: a } = reassembler.push(&frames_a[1]).unwrap()
        else {
            panic!("a incomplete");
        };
        let Inbound::Complete { header: hb, body: b } = reassembler.push(&frames_b[1]).unwrap()
        else {
            panic!("b incomplete");
        };
        assert_eq!(ha.message_id, 2);
        assert_eq!(hb.message_id, 4);
        assert_eq!(&a[..], &body_a[..]);
        assert_eq!(&b[..], &body_b[..]);
    }

    #[test]
    fn oversized_reassembly_is_dropped_with_the_offending_ids() {
        let body = vec![0u8; 4000];
        let frames =
            split_message(MessageHeader { correlation_id: 42, ..header(6) }, &body, 1000).unwrap();

        let mut reassembler = Reassembler::new(2500);
        let mut too_large = None;
        for frame in &frames {
            if let Inbound::TooLarge { message_id, correlation_id } =
                reassembler.push(frame).unwrap()
            {
                too_large = Some((message_id, correlation_id));
                break;
            }
        }
        let (message_id, correlation_id) = too_large.expect("limit must trip");
        assert_eq!(message_id, 6);
        assert_eq!(correlation_id, 42);
        assert_eq!(reassembler.in_progress(), 0, "partial buffer is discarded");
    }

    #[test]
    fn chunk_frames_are_complete_even_with_multipart_set() {
        let chunk = EtpBody::Chunk(etp_proto::messages::store::Chunk {
            blob_id: uuid::Uuid::new_v4(),
            data: vec![7; 32],
            final_chunk: false,
        });
        let chunk_header = MessageHeader::new(protocols::STORE, store::msg::CHUNK, 8, 0)
            .with_flags(MessageFlags::MULTIPART);
        let frame = codec::encode_message(&chunk_header, &chunk).unwrap();

        let mut reassembler = Reassembler::new(900_000);
        let Inbound::Complete { header, .. } = reassembler.push(&frame).unwrap() else {
            panic!("chunk frame must complete immediately");
        };
        assert!(header.is_multipart());
    }

    proptest! {
        /// Splitting then concatenating inbound frames yields the original
        /// body for any size and frame limit.
        #[test]
        fn split_reassemble_round_trip(
            len in 0usize..5000,
            max_frame in 1usize..2048,
        ) {
            let body: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
            let frames = split_message(header(2), &body, max_frame).unwrap();
            prop_assert_eq!(frames.len(), len.div_ceil(max_frame).max(1));

            let mut reassembler = Reassembler::new(usize::MAX);
            let mut complete = None;
            for frame in &frames {
                match reassembler.push(frame).unwrap() {
                    Inbound::Pending => {}
                    Inbound::Complete { body, .. } => complete = Some(body),
                    Inbound::TooLarge { .. } => prop_assert!(false, "no limit configured"),
                }
            }
            let reassembled = complete.expect("message completes");
            prop_assert_eq!(&reassembled[..], &body[..]);
        }
    }

    #[test]
    fn decoded_body_survives_the_frame_path() {
        let body = EtpBody::Ping(Ping { current_date_time: 1234 });
        let encoded = codec::encode_body(&body).unwrap();
        let frames = split_message(header(2), &encoded, 4).unwrap();
        assert!(frames.len() > 1);

        let mut reassembler = Reassembler::new(900_000);
        let mut result = None;
        for frame in &frames {
            if let Inbound::Complete { header, body } = reassembler.push(frame).unwrap() {
                result =
                    Some(codec::decode_body(header.protocol, header.message_type, &body).unwrap());
            }
        }
        assert_eq!(result.unwrap(), body);
    }
}
