// etp-client: async ETP v1.2 client over WebSocket.
//
// Layering, bottom up: `transport` opens the authenticated socket;
// `framing` splits and reassembles frames; `session` owns the connection
// task and the handshake state machine; `correlator` pairs requests with
// their multi-part replies; `handlers` build and accumulate per-protocol
// messages; `client` is the facade applications call.

pub mod auth;
pub mod chunking;
pub mod client;
pub mod config;
mod correlator;
pub mod error;
pub mod events;
mod framing;
mod handlers;
pub mod session;
pub mod transport;

pub use auth::{Credentials, TokenError, TokenSource};
pub use client::EtpClient;
pub use config::{ConfigError, DataspaceAcl, EtpConfig};
pub use error::{ClientError, Outcome};
pub use events::SessionEvent;
pub use handlers::discovery::DiscoveryResult;
pub use session::{SessionCapabilities, SessionState};
