//! Dataspace protocol (24) requests and reply accumulation.

use std::collections::BTreeMap;

use etp_proto::EtpBody;
use etp_proto::messages::DataValue;
use etp_proto::messages::dataspace::{Dataspace, DeleteDataspaces, GetDataspaces, PutDataspaces};
use etp_proto::uri;

use super::{collect, now_micros, single};
use crate::config::DataspaceAcl;
use crate::error::{ClientError, Outcome};

pub(crate) fn get_dataspaces_request(store_last_write_filter: Option<i64>) -> EtpBody {
    EtpBody::GetDataspaces(GetDataspaces { store_last_write_filter })
}

/// Build a put for one or more dataspace names or URIs.
///
/// The optional ACL lands in each dataspace's custom data under the keys
/// OSDU stores read (`acl_owners`, `acl_viewers`, `legal_tags`,
/// `data_countries`).
pub(crate) fn put_dataspaces_request<S: AsRef<str>>(
    names: impl IntoIterator<Item = S>,
    acl: Option<&DataspaceAcl>,
) -> EtpBody {
    let now = now_micros();
    let custom_data: BTreeMap<String, DataValue> = match acl {
        None => BTreeMap::new(),
        Some(acl) => BTreeMap::from([
            ("acl_owners".to_owned(), DataValue::StringArray(acl.owners.clone())),
            ("acl_viewers".to_owned(), DataValue::StringArray(acl.viewers.clone())),
            ("legal_tags".to_owned(), DataValue::StringArray(acl.legal_tags.clone())),
            ("data_countries".to_owned(), DataValue::StringArray(acl.data_countries.clone())),
        ]),
    };
    let dataspaces = uri::uri_map(names)
        .into_iter()
        .map(|(key, uri)| {
            (
                key,
                Dataspace {
                    uri,
                    path: None,
                    store_last_write: now,
                    store_created: now,
                    custom_data: custom_data.clone(),
                },
            )
        })
        .collect();
    EtpBody::PutDataspaces(PutDataspaces { dataspaces })
}

pub(crate) fn delete_dataspaces_request<S: AsRef<str>>(
    names: impl IntoIterator<Item = S>,
) -> EtpBody {
    EtpBody::DeleteDataspaces(DeleteDataspaces { uris: uri::uri_map(names) })
}

pub(crate) fn collect_dataspaces(
    parts: Vec<EtpBody>,
) -> Result<Outcome<Vec<Dataspace>>, ClientError> {
    collect(parts, Vec::new(), |dataspaces, part| match part {
        EtpBody::GetDataspacesResponse(response) => {
            dataspaces.extend(response.dataspaces);
            None
        }
        other => Some(other),
    })
}

pub(crate) fn collect_put_success(
    parts: Vec<EtpBody>,
) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
    single(parts, "PutDataspacesResponse", |part| match part {
        EtpBody::PutDataspacesResponse(response) => Ok(response.success),
        other => Err(other),
    })
}

pub(crate) fn collect_delete_success(
    parts: Vec<EtpBody>,
) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
    single(parts, "DeleteDataspacesResponse", |part| match part {
        EtpBody::DeleteDataspacesResponse(response) => Ok(response.success),
        other => Err(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use etp_proto::messages::core::ProtocolException;
    use etp_proto::messages::dataspace::GetDataspacesResponse;

    fn dataspace(uri: &str) -> Dataspace {
        Dataspace {
            uri: uri.to_owned(),
            path: None,
            store_last_write: 0,
            store_created: 0,
            custom_data: BTreeMap::new(),
        }
    }

    #[test]
    fn plain_names_are_normalized_into_uris() {
        let EtpBody::PutDataspaces(put) = put_dataspaces_request(["demo"], None) else {
            panic!("expected PutDataspaces");
        };
        assert_eq!(put.dataspaces["0"].uri, "eml:///dataspace('demo')");
    }

    #[test]
    fn acl_lands_in_custom_data() {
        let acl = DataspaceAcl {
            owners: vec!["owners@osdu".to_owned()],
            viewers: vec![],
            legal_tags: vec!["public".to_owned()],
            data_countries: vec!["FR".to_owned()],
        };
        let EtpBody::PutDataspaces(put) = put_dataspaces_request(["demo"], Some(&acl)) else {
            panic!("expected PutDataspaces");
        };
        let custom = &put.dataspaces["0"].custom_data;
        assert_eq!(
            custom.get("acl_owners"),
            Some(&DataValue::StringArray(vec!["owners@osdu".to_owned()]))
        );
        assert_eq!(
            custom.get("legal_tags"),
            Some(&DataValue::StringArray(vec!["public".to_owned()]))
        );
    }

    #[test]
    fn streamed_responses_accumulate_in_order() {
        let parts = vec![
            EtpBody::GetDataspacesResponse(GetDataspacesResponse {
                dataspaces: vec![dataspace("eml:///dataspace('A')")],
            }),
            EtpBody::GetDataspacesResponse(GetDataspacesResponse {
                dataspaces: vec![dataspace("eml:///dataspace('B')")],
            }),
        ];
        let Outcome::Value(dataspaces) = collect_dataspaces(parts).unwrap() else {
            panic!("expected value");
        };
        let uris: Vec<&str> = dataspaces.iter().map(|d| d.uri.as_str()).collect();
        assert_eq!(uris, vec!["eml:///dataspace('A')", "eml:///dataspace('B')"]);
    }

    #[test]
    fn an_exception_part_becomes_rejected() {
        let parts = vec![EtpBody::ProtocolException(ProtocolException {
            code: 6,
            message: "unsupported".to_owned(),
        })];
        let outcome = collect_dataspaces(parts).unwrap();
        assert!(outcome.is_rejected());
    }
}
