//! Transaction protocol (18) requests and reply accumulation.

use etp_proto::EtpBody;
use etp_proto::messages::transaction::{
    CommitTransaction, CommitTransactionResponse, RollbackTransaction,
    RollbackTransactionResponse, StartTransaction, StartTransactionResponse,
};
use etp_proto::uri;
use uuid::Uuid;

use super::single;
use crate::error::{ClientError, Outcome};

pub(crate) fn start_transaction_request<S: AsRef<str>>(
    dataspaces: impl IntoIterator<Item = S>,
    read_only: bool,
) -> EtpBody {
    EtpBody::StartTransaction(StartTransaction {
        dataspace_uris: uri::uri_list(dataspaces),
        read_only,
        message: String::new(),
    })
}

pub(crate) fn commit_transaction_request(transaction_uuid: Uuid) -> EtpBody {
    EtpBody::CommitTransaction(CommitTransaction { transaction_uuid })
}

pub(crate) fn rollback_transaction_request(transaction_uuid: Uuid) -> EtpBody {
    EtpBody::RollbackTransaction(RollbackTransaction { transaction_uuid })
}

pub(crate) fn collect_start(
    parts: Vec<EtpBody>,
) -> Result<Outcome<StartTransactionResponse>, ClientError> {
    single(parts, "StartTransactionResponse", |part| match part {
        EtpBody::StartTransactionResponse(response) => Ok(response),
        other => Err(other),
    })
}

pub(crate) fn collect_commit(
    parts: Vec<EtpBody>,
) -> Result<Outcome<CommitTransactionResponse>, ClientError> {
    single(parts, "CommitTransactionResponse", |part| match part {
        EtpBody::CommitTransactionResponse(response) => Ok(response),
        other => Err(other),
    })
}

pub(crate) fn collect_rollback(
    parts: Vec<EtpBody>,
) -> Result<Outcome<RollbackTransactionResponse>, ClientError> {
    single(parts, "RollbackTransactionResponse", |part| match part {
        EtpBody::RollbackTransactionResponse(response) => Ok(response),
        other => Err(other),
    })
}
