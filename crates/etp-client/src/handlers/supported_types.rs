//! SupportedTypes protocol (25) requests and reply accumulation.

use etp_proto::EtpBody;
use etp_proto::messages::ContextScopeKind;
use etp_proto::messages::supported_types::{GetSupportedTypes, SupportedType};
use etp_proto::uri::canonical_uri;

use super::collect;
use crate::error::{ClientError, Outcome};

pub(crate) fn get_supported_types_request(uri: Option<&str>) -> EtpBody {
    EtpBody::GetSupportedTypes(GetSupportedTypes {
        uri: canonical_uri(uri),
        scope: ContextScopeKind::Self_,
        return_empty_types: false,
        count_objects: true,
    })
}

pub(crate) fn collect_supported_types(
    parts: Vec<EtpBody>,
) -> Result<Outcome<Vec<SupportedType>>, ClientError> {
    collect(parts, Vec::new(), |types, part| match part {
        EtpBody::GetSupportedTypesResponse(response) => {
            types.extend(response.supported_types);
            None
        }
        other => Some(other),
    })
}
