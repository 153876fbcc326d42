use thiserror::Error;

/// Errors raised by the codec adapter.
///
/// `UnknownMessageType` is surfaced to callers but is NOT session-fatal:
/// a peer may legitimately speak messages this client does not implement.
/// `Format` indicates a frame that could not be decoded against its schema
/// and is treated as fatal by the session layer.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("avro: {0}")]
    Avro(#[from] apache_avro::Error),
    #[error("format: {0}")]
    Format(String),
    #[error("unknown message type: protocol {protocol} message {message_type}")]
    UnknownMessageType { protocol: i32, message_type: i32 },
}

impl CodecError {
    pub(crate) fn format(context: impl Into<String>) -> Self {
        CodecError::Format(context.into())
    }
}
