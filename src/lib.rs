//! etp-rs: an ETP v1.2 client for energy-domain stores.
//!
//! The workspace splits into [`etp_proto`] (wire model and Avro codec)
//! and [`etp_client`] (session, correlation, protocol handlers, facade);
//! this umbrella crate re-exports both.
//!
//! ```no_run
//! use etp_rs::{EtpClient, EtpConfig};
//!
//! # async fn demo() -> Result<(), etp_rs::ClientError> {
//! let client = EtpClient::connect(EtpConfig::new("wss://etp.example.com")).await?;
//! match client.get_dataspaces(None).await? {
//!     etp_rs::Outcome::Value(dataspaces) => {
//!         for dataspace in dataspaces {
//!             println!("{}", dataspace.uri);
//!         }
//!     }
//!     etp_rs::Outcome::Rejected(exception) => {
//!         eprintln!("store said no: {} ({})", exception.message, exception.code);
//!     }
//! }
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub use etp_client::{
    ClientError, Credentials, DataspaceAcl, DiscoveryResult, EtpClient, EtpConfig, Outcome,
    SessionCapabilities, SessionEvent, SessionState, TokenSource,
};
pub use etp_proto as proto;
pub use etp_proto::{AnyArray, EtpBody, MessageFlags, MessageHeader};
