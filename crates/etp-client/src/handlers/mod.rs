//! Per-protocol request builders and response accumulators.
//!
//! Builders produce [`EtpBody`] values for the correlator to send;
//! collectors fold the ordered reply parts of one correlation into a
//! typed [`Outcome`].  A correlated `ProtocolException` short-circuits any
//! collector into `Outcome::Rejected`; reply bodies a collector does not
//! expect are logged and skipped, the way unknown messages are elsewhere.

pub(crate) mod core;
pub(crate) mod dataarray;
pub(crate) mod dataspace;
pub(crate) mod discovery;
pub(crate) mod store;
pub(crate) mod supported_types;
pub(crate) mod transaction;

use etp_proto::{CodecError, EtpBody};
use tracing::warn;

use crate::error::{ClientError, Outcome};

/// Microseconds since the Unix epoch, as ETP timestamps every message.
pub(crate) fn now_micros() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Fold reply parts with an accumulator.
pub(crate) fn collect<T>(
    parts: Vec<EtpBody>,
    mut state: T,
    mut accumulate: impl FnMut(&mut T, EtpBody) -> Option<EtpBody>,
) -> Result<Outcome<T>, ClientError> {
    for part in parts {
        if let EtpBody::ProtocolException(exception) = part {
            return Ok(Outcome::Rejected(exception));
        }
        if let Some(unhandled) = accumulate(&mut state, part) {
            warn!(body = unhandled.name(), "ignoring unexpected reply body");
        }
    }
    Ok(Outcome::Value(state))
}

/// Extract exactly one value from the reply parts.
pub(crate) fn single<T>(
    parts: Vec<EtpBody>,
    what: &'static str,
    mut extract: impl FnMut(EtpBody) -> Result<T, EtpBody>,
) -> Result<Outcome<T>, ClientError> {
    let mut found = None;
    for part in parts {
        if let EtpBody::ProtocolException(exception) = part {
            return Ok(Outcome::Rejected(exception));
        }
        match extract(part) {
            Ok(value) if found.is_none() => found = Some(value),
            Ok(_) => warn!(what, "duplicate reply body, keeping the first"),
            Err(unhandled) => warn!(body = unhandled.name(), "ignoring unexpected reply body"),
        }
    }
    match found {
        Some(value) => Ok(Outcome::Value(value)),
        None => Err(CodecError::Format(format!("reply carried no {what}")).into()),
    }
}
