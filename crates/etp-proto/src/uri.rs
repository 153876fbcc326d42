//! ETP URI handling and normalization.
//!
//! URIs take the form `eml:///dataspace('<name>')[/<qualifiedType>(<uuid>)]`.
//! Store and discovery operations accept several input shapes (single
//! string, parsed URI, list, keyed map); any plain string that does not
//! start with `eml:///` is interpreted as a dataspace *name* and rewritten
//! to `eml:///dataspace('<name>')`.  The rewrite is logged at WARN level so
//! ambiguous call sites stay observable.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

pub const URI_ROOT: &str = "eml:///";

#[derive(Debug, Error)]
#[error("invalid ETP uri: {0}")]
pub struct UriError(pub String);

/// A parsed ETP URI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EtpUri {
    /// Dataspace name, e.g. `brgm` in `eml:///dataspace('brgm')`.
    pub dataspace: Option<String>,
    /// Qualified type and uuid of an addressed object, e.g.
    /// `resqml22.FaultInterpretation` / `4442ce2b-…`.
    pub object: Option<(String, String)>,
}

impl EtpUri {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn for_dataspace(name: impl Into<String>) -> Self {
        Self {
            dataspace: Some(name.into()),
            object: None,
        }
    }
}

impl fmt::Display for EtpUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URI_ROOT}")?;
        if let Some(dataspace) = &self.dataspace {
            write!(f, "dataspace('{dataspace}')")?;
            if self.object.is_some() {
                write!(f, "/")?;
            }
        }
        if let Some((qualified_type, uuid)) = &self.object {
            write!(f, "{qualified_type}({uuid})")?;
        }
        Ok(())
    }
}

impl FromStr for EtpUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(URI_ROOT)
            .ok_or_else(|| UriError(s.to_owned()))?;
        if rest.is_empty() {
            return Ok(Self::root());
        }

        let (dataspace, rest) = match rest.strip_prefix("dataspace('") {
            Some(tail) => {
                let end = tail.find("')").ok_or_else(|| UriError(s.to_owned()))?;
                let name = &tail[..end];
                let remainder = tail[end + 2..].trim_start_matches('/');
                (Some(name.to_owned()), remainder)
            }
            None => (None, rest),
        };

        let object = if rest.is_empty() {
            None
        } else {
            let open = rest.find('(').ok_or_else(|| UriError(s.to_owned()))?;
            let close = rest.rfind(')').ok_or_else(|| UriError(s.to_owned()))?;
            if close <= open + 1 {
                return Err(UriError(s.to_owned()));
            }
            Some((rest[..open].to_owned(), rest[open + 1..close].to_owned()))
        };

        Ok(Self { dataspace, object })
    }
}

/// Normalize one URI input.
///
/// `None` maps to the store root `eml:///`; a string already in URI form is
/// passed through untouched; anything else is treated as a dataspace name.
/// Normalization is idempotent.
pub fn canonical_uri(input: Option<&str>) -> String {
    match input {
        None => URI_ROOT.to_owned(),
        Some(s) if s.starts_with(URI_ROOT) => s.to_owned(),
        Some(s) => {
            let uri = EtpUri::for_dataspace(s).to_string();
            warn!(input = %s, uri = %uri, "non-URI string rewritten to dataspace URI");
            uri
        }
    }
}

/// Normalize a sequence of URI inputs into a list, preserving order.
pub fn uri_list<I, S>(inputs: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    inputs
        .into_iter()
        .map(|s| canonical_uri(Some(s.as_ref())))
        .collect()
}

/// Normalize a sequence of URI inputs into a keyed map.
///
/// List inputs produce numeric string keys `"0"`, `"1"`, … as the wire
/// format demands maps for most store operations.
pub fn uri_map<I, S>(inputs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, s)| (i.to_string(), canonical_uri(Some(s.as_ref()))))
        .collect()
}

/// Normalize the values of an already-keyed map, preserving its keys.
pub fn uri_map_keyed<K, S>(inputs: impl IntoIterator<Item = (K, S)>) -> BTreeMap<String, String>
where
    K: Into<String>,
    S: AsRef<str>,
{
    inputs
        .into_iter()
        .map(|(k, s)| (k.into(), canonical_uri(Some(s.as_ref()))))
        .collect()
}
