//! DataArray protocol (9) requests and reply accumulation.
//!
//! Whole-array requests address one array per call (keyed `"0"` on the
//! wire, which demands maps); the tiled paths issue one subarray message
//! per window so no single message outgrows the negotiated array size.

use std::collections::BTreeMap;

use etp_proto::EtpBody;
use etp_proto::arrays::AnyArray;
use etp_proto::messages::dataarray::{
    DataArray, DataArrayIdentifier, DataArrayMetadata, GetDataArrayMetadata, GetDataArrays,
    GetDataSubarrays, GetDataSubarraysType, PutDataArrays, PutDataArraysType, PutDataSubarrays,
    PutDataSubarraysType,
};
use etp_proto::uri::canonical_uri;

use super::single;
use crate::chunking::SubarrayWindow;
use crate::error::{ClientError, Outcome};

pub(crate) fn identifier(uri: &str, path_in_resource: &str) -> DataArrayIdentifier {
    DataArrayIdentifier {
        uri: canonical_uri(Some(uri)),
        path_in_resource: path_in_resource.to_owned(),
    }
}

fn keyed<T>(value: T) -> BTreeMap<String, T> {
    BTreeMap::from([("0".to_owned(), value)])
}

pub(crate) fn get_data_arrays_request(uid: DataArrayIdentifier) -> EtpBody {
    EtpBody::GetDataArrays(GetDataArrays { data_arrays: keyed(uid) })
}

pub(crate) fn get_metadata_request(uid: DataArrayIdentifier) -> EtpBody {
    EtpBody::GetDataArrayMetadata(GetDataArrayMetadata { data_arrays: keyed(uid) })
}

pub(crate) fn put_data_arrays_request(uid: DataArrayIdentifier, array: DataArray) -> EtpBody {
    EtpBody::PutDataArrays(PutDataArrays { data_arrays: keyed(PutDataArraysType { uid, array }) })
}

pub(crate) fn get_subarray_request(uid: DataArrayIdentifier, window: &SubarrayWindow) -> EtpBody {
    EtpBody::GetDataSubarrays(GetDataSubarrays {
        data_subarrays: keyed(GetDataSubarraysType {
            uid,
            starts: window.starts.clone(),
            counts: window.counts.clone(),
        }),
    })
}

pub(crate) fn put_subarray_request(
    uid: DataArrayIdentifier,
    data: AnyArray,
    window: &SubarrayWindow,
) -> EtpBody {
    EtpBody::PutDataSubarrays(PutDataSubarrays {
        data_subarrays: keyed(PutDataSubarraysType {
            uid,
            data,
            starts: window.starts.clone(),
            counts: window.counts.clone(),
        }),
    })
}

pub(crate) fn collect_data_array(
    parts: Vec<EtpBody>,
) -> Result<Outcome<Option<DataArray>>, ClientError> {
    single(parts, "GetDataArraysResponse", |part| match part {
        EtpBody::GetDataArraysResponse(mut response) => {
            Ok(response.data_arrays.remove("0"))
        }
        other => Err(other),
    })
}

pub(crate) fn collect_metadata(
    parts: Vec<EtpBody>,
) -> Result<Outcome<Option<DataArrayMetadata>>, ClientError> {
    single(parts, "GetDataArrayMetadataResponse", |part| match part {
        EtpBody::GetDataArrayMetadataResponse(mut response) => {
            Ok(response.array_metadata.remove("0"))
        }
        other => Err(other),
    })
}

pub(crate) fn collect_subarray(
    parts: Vec<EtpBody>,
) -> Result<Outcome<Option<DataArray>>, ClientError> {
    single(parts, "GetDataSubarraysResponse", |part| match part {
        EtpBody::GetDataSubarraysResponse(mut response) => {
            Ok(response.data_subarrays.remove("0"))
        }
        other => Err(other),
    })
}

pub(crate) fn collect_put_success(
    parts: Vec<EtpBody>,
) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
    single(parts, "PutDataArraysResponse", |part| match part {
        EtpBody::PutDataArraysResponse(response) => Ok(response.success),
        other => Err(other),
    })
}

pub(crate) fn collect_put_subarray_success(
    parts: Vec<EtpBody>,
) -> Result<Outcome<BTreeMap<String, bool>>, ClientError> {
    single(parts, "PutDataSubarraysResponse", |part| match part {
        EtpBody::PutDataSubarraysResponse(response) => Ok(response.success),
        other => Err(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_normalize_bare_dataspace_names() {
        let uid = identifier("demo", "/test/points");
        assert_eq!(uid.uri, "eml:///dataspace('demo')");
        assert_eq!(uid.path_in_resource, "/test/points");
    }

    #[test]
    fn subarray_requests_carry_the_window_coordinates() {
        let uid = identifier("eml:///dataspace('d')", "/p");
        let window = SubarrayWindow { starts: vec![250, 0], counts: vec![250, 1000] };
        let EtpBody::GetDataSubarrays(request) = get_subarray_request(uid, &window) else {
            panic!("expected GetDataSubarrays");
        };
        assert_eq!(request.data_subarrays["0"].starts, vec![250, 0]);
        assert_eq!(request.data_subarrays["0"].counts, vec![250, 1000]);
    }
}
