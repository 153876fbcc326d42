// etp-test-utils: a scriptable mock ETP server for integration testing.
//
// Speaks the binary protocol (Avro header + body frames) over WebSocket,
// far enough to exercise the client's handshake, correlation, chunking,
// and timeout paths against a real socket.

pub mod mock_server;

pub use mock_server::{MockBehavior, MockEtpServer};
