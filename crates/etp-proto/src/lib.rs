// etp-proto: ETP v1.2 wire model and Avro codec.
//
// One crate owns the frozen wire surface: the message header, the typed
// bodies of every sub-protocol the client speaks, the `(protocol,
// messageType)` dispatch table, URI normalization, and the array
// element-kind mapping.  Nothing in here performs I/O.

pub mod arrays;
pub mod body;
pub mod codec;
pub mod error;
pub mod header;
pub mod messages;
pub mod uri;

pub use arrays::{AnyArray, AnyArrayType, ElementKind};
pub use body::EtpBody;
pub use error::CodecError;
pub use header::{MessageFlags, MessageHeader};

/// Sub-protocol discriminants (the `protocol` header field).
///
/// Values are fixed by the ETP v1.2 specification.
pub mod protocols {
    pub const CORE: i32 = 0;
    pub const DISCOVERY: i32 = 3;
    pub const STORE: i32 = 4;
    pub const DATA_ARRAY: i32 = 9;
    pub const TRANSACTION: i32 = 18;
    pub const DATASPACE: i32 = 24;
    pub const SUPPORTED_TYPES: i32 = 25;
}

/// Endpoint capability keys negotiated during the session handshake.
pub mod capabilities {
    pub const MAX_WEB_SOCKET_FRAME_PAYLOAD_SIZE: &str = "MaxWebSocketFramePayloadSize";
    pub const MAX_WEB_SOCKET_MESSAGE_PAYLOAD_SIZE: &str = "MaxWebSocketMessagePayloadSize";
    pub const MAX_DATA_ARRAY_SIZE: &str = "MaxDataArraySize";
    pub const MAX_DATA_OBJECT_SIZE: &str = "MaxDataObjectSize";
    pub const SUPPORTS_ALTERABLE_METADATA: &str = "SupportsAlterableMetadata";

    /// Conservative fallback applied when a peer advertises no frame or
    /// message payload limit (or advertises 0).
    pub const DEFAULT_PAYLOAD_SIZE: i64 = 900_000;
}
