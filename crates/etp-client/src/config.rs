//! Client configuration loading.
//!
//! TOML is the sole config source; no environment variable overrides.
//!
//! # Required fields
//! - `url`
//!
//! # Credentials
//! `access_token` wins over `username`/`password`; with neither, the
//! upgrade request carries no `Authorization` header.  A token file path
//! may be given instead of an inline token (`access_token_file`); the file
//! holds the raw token on a single line and is trimmed on read.
//!
//! # Optional blocks
//! - `[additional_headers]` merged into the upgrade request
//! - `acl_owners` / `acl_viewers` / `legal_tags` / `data_countries`,
//!   the default ACL applied by `put_dataspaces_with_acl`

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::auth::Credentials;

pub const DEFAULT_APPLICATION_NAME: &str = "etp-rs";
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config read: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config: missing required field `{0}`")]
    Missing(&'static str),
}

/// Default ACL applied when putting dataspaces on an OSDU-style store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataspaceAcl {
    pub owners: Vec<String>,
    pub viewers: Vec<String>,
    pub legal_tags: Vec<String>,
    pub data_countries: Vec<String>,
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct EtpConfig {
    /// Endpoint URL; `http(s)://` inputs are rewritten to `ws(s)://` at
    /// connect time.
    pub url: String,
    pub credentials: Credentials,
    pub additional_headers: BTreeMap<String, String>,
    /// Disable TLS certificate verification.  Development only.
    pub verify_tls: bool,
    pub application_name: String,
    pub application_version: String,
    /// Advertised in the session handshake; the server may reduce them.
    pub max_ws_frame_payload_size: i64,
    pub max_ws_message_payload_size: i64,
    pub handshake_timeout: Duration,
    /// Applied to facade calls that do not pass an explicit timeout.
    pub request_timeout: Duration,
    pub default_acl: Option<DataspaceAcl>,
}

impl EtpConfig {
    /// A configuration with defaults for everything but the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: Credentials::None,
            additional_headers: BTreeMap::new(),
            verify_tls: true,
            application_name: DEFAULT_APPLICATION_NAME.to_owned(),
            application_version: env!("CARGO_PKG_VERSION").to_owned(),
            max_ws_frame_payload_size: etp_proto::capabilities::DEFAULT_PAYLOAD_SIZE,
            max_ws_message_payload_size: etp_proto::capabilities::DEFAULT_PAYLOAD_SIZE,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            default_acl: None,
        }
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(&std::fs::read_to_string(path)?)?;
        raw.validate()
    }

    /// Parse and validate TOML config text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        raw.validate()
    }
}

// ---------------------------------------------------------------------------
// Raw TOML deserialization types (with Option for optional fields)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawConfig {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    access_token: Option<String>,
    access_token_file: Option<String>,
    additional_headers: Option<BTreeMap<String, String>>,
    verify: Option<bool>,
    application_name: Option<String>,
    application_version: Option<String>,
    max_ws_frame_payload_size: Option<i64>,
    max_ws_message_payload_size: Option<i64>,
    handshake_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    acl_owners: Option<Vec<String>>,
    acl_viewers: Option<Vec<String>>,
    legal_tags: Option<Vec<String>>,
    data_countries: Option<Vec<String>>,
}

impl RawConfig {
    fn validate(self) -> Result<EtpConfig, ConfigError> {
        let mut config = EtpConfig::new(self.url.ok_or(ConfigError::Missing("url"))?);

        let token = match (self.access_token, self.access_token_file) {
            (Some(token), _) => Some(token),
            (None, Some(path)) => Some(std::fs::read_to_string(path)?.trim().to_owned()),
            (None, None) => None,
        };
        config.credentials = match (token, self.username) {
            (Some(token), _) => Credentials::bearer(token),
            (None, Some(username)) => {
                Credentials::basic(username, self.password.unwrap_or_default())
            }
            (None, None) => Credentials::None,
        };

        if let Some(headers) = self.additional_headers {
            config.additional_headers = headers;
        }
        if let Some(verify) = self.verify {
            config.verify_tls = verify;
        }
        if let Some(name) = self.application_name {
            config.application_name = name;
        }
        if let Some(version) = self.application_version {
            config.application_version = version;
        }
        if let Some(size) = self.max_ws_frame_payload_size {
            config.max_ws_frame_payload_size = size;
        }
        if let Some(size) = self.max_ws_message_payload_size {
            config.max_ws_message_payload_size = size;
        }
        if let Some(ms) = self.handshake_timeout_ms {
            config.handshake_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }

        let has_acl = self.acl_owners.is_some()
            || self.acl_viewers.is_some()
            || self.legal_tags.is_some()
            || self.data_countries.is_some();
        if has_acl {
            config.default_acl = Some(DataspaceAcl {
                owners: self.acl_owners.unwrap_or_default(),
                viewers: self.acl_viewers.unwrap_or_default(),
                legal_tags: self.legal_tags.unwrap_or_default(),
                data_countries: self.data_countries.unwrap_or_default(),
            });
        }

        Ok(config)
    }
}
