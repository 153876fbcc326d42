//! Transaction lifecycle and the local at-most-one guard.

use etp_client::{ClientError, EtpClient, EtpConfig, Outcome};
use etp_test_utils::{MockBehavior, MockEtpServer};

#[tokio::test]
async fn at_most_one_transaction_per_session() {
    let server = MockEtpServer::start(MockBehavior::default()).await.unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let Outcome::Value(started) =
        client.start_transaction(["demo"], false, None).await.unwrap()
    else {
        panic!("expected a started transaction");
    };
    assert!(started.successful);
    assert_eq!(client.active_transaction(), Some(started.transaction_uuid));

    // A second start fails locally, before any frame is built.
    let pending_before = client.pending_requests();
    let err = client.start_transaction(["other"], false, None).await.unwrap_err();
    assert!(matches!(err, ClientError::TransactionAlreadyActive), "got {err:?}");
    assert_eq!(client.pending_requests(), pending_before, "no request was issued");
    assert_eq!(client.active_transaction(), Some(started.transaction_uuid));

    let Outcome::Value(committed) = client.commit_transaction(None).await.unwrap() else {
        panic!("expected a commit response");
    };
    assert!(committed.successful);
    assert_eq!(committed.transaction_uuid, started.transaction_uuid);
    assert_eq!(client.active_transaction(), None);

    // With the handle cleared, commit and rollback have nothing to act on.
    let err = client.commit_transaction(None).await.unwrap_err();
    assert!(matches!(err, ClientError::NoActiveTransaction), "got {err:?}");

    client.close().await;
}

#[tokio::test]
async fn rollback_clears_the_local_handle() {
    let server = MockEtpServer::start(MockBehavior::default()).await.unwrap();
    let client = EtpClient::connect(EtpConfig::new(server.url())).await.unwrap();

    let Outcome::Value(started) =
        client.start_transaction(["demo"], true, None).await.unwrap()
    else {
        panic!("expected a started transaction");
    };
    assert!(client.active_transaction().is_some());

    let Outcome::Value(rolled_back) = client.rollback_transaction(None).await.unwrap() else {
        panic!("expected a rollback response");
    };
    assert!(rolled_back.successful);
    assert_eq!(rolled_back.transaction_uuid, started.transaction_uuid);
    assert_eq!(client.active_transaction(), None);

    // The session can start a fresh transaction afterwards.
    let outcome = client.start_transaction(["demo"], false, None).await.unwrap();
    assert!(!outcome.is_rejected());

    client.close().await;
}
