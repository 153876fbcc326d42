//! Core protocol (0) requests: handshake, keep-alive, authorization.

use std::collections::BTreeMap;

use etp_proto::messages::core::{
    Authorize, AuthorizeResponse, Ping, Pong, ProtocolVersion, RequestSession, SupportedProtocol,
};
use etp_proto::messages::{DataValue, DataValueMap};
use etp_proto::{EtpBody, capabilities, protocols};
use uuid::Uuid;

use super::{now_micros, single};
use crate::config::EtpConfig;
use crate::error::{ClientError, Outcome};

/// Every sub-protocol this client asks the server to serve.  Core is
/// implicit and never requested.
const REQUESTED_PROTOCOLS: [i32; 6] = [
    protocols::DISCOVERY,
    protocols::STORE,
    protocols::DATA_ARRAY,
    protocols::TRANSACTION,
    protocols::DATASPACE,
    protocols::SUPPORTED_TYPES,
];

/// Build the handshake request from the client configuration.
pub(crate) fn request_session(config: &EtpConfig, client_instance_id: Uuid) -> EtpBody {
    let endpoint_capabilities: DataValueMap = BTreeMap::from([
        (
            capabilities::MAX_WEB_SOCKET_FRAME_PAYLOAD_SIZE.to_owned(),
            DataValue::Long(config.max_ws_frame_payload_size),
        ),
        (
            capabilities::MAX_WEB_SOCKET_MESSAGE_PAYLOAD_SIZE.to_owned(),
            DataValue::Long(config.max_ws_message_payload_size),
        ),
    ]);
    EtpBody::RequestSession(RequestSession {
        application_name: config.application_name.clone(),
        application_version: config.application_version.clone(),
        client_instance_id,
        requested_protocols: REQUESTED_PROTOCOLS
            .iter()
            .map(|&protocol| SupportedProtocol {
                protocol,
                protocol_version: ProtocolVersion::V1_2,
                role: "store".to_owned(),
            })
            .collect(),
        supported_formats: vec!["xml".to_owned(), "json".to_owned()],
        current_date_time: now_micros(),
        endpoint_capabilities,
    })
}

pub(crate) fn ping_request() -> EtpBody {
    EtpBody::Ping(Ping { current_date_time: now_micros() })
}

pub(crate) fn authorize_request(
    authorization: String,
    supplemental: BTreeMap<String, String>,
) -> EtpBody {
    EtpBody::Authorize(Authorize { authorization, supplemental_authorization: supplemental })
}

pub(crate) fn collect_pong(parts: Vec<EtpBody>) -> Result<Outcome<Pong>, ClientError> {
    single(parts, "Pong", |part| match part {
        EtpBody::Pong(pong) => Ok(pong),
        other => Err(other),
    })
}

pub(crate) fn collect_authorize(
    parts: Vec<EtpBody>,
) -> Result<Outcome<AuthorizeResponse>, ClientError> {
    single(parts, "AuthorizeResponse", |part| match part {
        EtpBody::AuthorizeResponse(response) => Ok(response),
        other => Err(other),
    })
}
