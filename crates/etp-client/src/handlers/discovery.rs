//! Discovery protocol (3) requests and reply accumulation.

use etp_proto::EtpBody;
use etp_proto::messages::ContextScopeKind;
use etp_proto::messages::discovery::{Edge, GetResources, Resource};
use etp_proto::uri::canonical_uri;

use super::collect;
use crate::error::{ClientError, Outcome};

/// Aggregated result of one `GetResources` conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryResult {
    pub resources: Vec<Resource>,
    /// Only populated when the query asked for edges.
    pub edges: Vec<Edge>,
}

/// A default query: direct members of `uri`, no edge traversal.
pub(crate) fn get_resources_request(uri: Option<&str>, depth: i32) -> EtpBody {
    EtpBody::GetResources(GetResources {
        uri: canonical_uri(uri),
        depth,
        scope: ContextScopeKind::Self_,
        count_objects: true,
        store_last_write_filter: None,
        active_status_filter: None,
        include_edges: false,
    })
}

/// Pass a fully specified query through, normalizing its URI.
pub(crate) fn get_resources_request_with(mut request: GetResources) -> EtpBody {
    request.uri = canonical_uri(Some(&request.uri));
    EtpBody::GetResources(request)
}

pub(crate) fn collect_resources(
    parts: Vec<EtpBody>,
) -> Result<Outcome<DiscoveryResult>, ClientError> {
    collect(parts, DiscoveryResult::default(), |result, part| match part {
        EtpBody::GetResourcesResponse(response) => {
            result.resources.extend(response.resources);
            None
        }
        EtpBody::GetResourcesEdgesResponse(response) => {
            result.edges.extend(response.edges);
            None
        }
        other => Some(other),
    })
}

#[cfg(test)]
mod tests {
    use etp_proto::messages::ActiveStatusKind;
    use etp_proto::messages::discovery::{GetResourcesEdgesResponse, GetResourcesResponse};

    use super::*;

    #[test]
    fn default_request_normalizes_a_bare_name() {
        let EtpBody::GetResources(request) = get_resources_request(Some("brgm"), 1) else {
            panic!("expected GetResources");
        };
        assert_eq!(request.uri, "eml:///dataspace('brgm')");
        assert_eq!(request.depth, 1);
    }

    #[test]
    fn resources_and_edges_accumulate_separately() {
        let resource = Resource {
            uri: "eml:///dataspace('a')/resqml22.Fault(u)".to_owned(),
            name: "f".to_owned(),
            source_count: None,
            target_count: None,
            last_changed: 0,
            store_last_write: 0,
            active_status: ActiveStatusKind::Active,
        };
        let parts = vec![
            EtpBody::GetResourcesResponse(GetResourcesResponse {
                resources: vec![resource.clone()],
            }),
            EtpBody::GetResourcesEdgesResponse(GetResourcesEdgesResponse {
                edges: vec![Edge {
                    source_uri: resource.uri.clone(),
                    target_uri: "eml:///dataspace('a')/resqml22.Horizon(v)".to_owned(),
                }],
            }),
        ];
        let Outcome::Value(result) = collect_resources(parts).unwrap() else {
            panic!("expected value");
        };
        assert_eq!(result.resources.len(), 1);
        assert_eq!(result.edges.len(), 1);
    }
}
