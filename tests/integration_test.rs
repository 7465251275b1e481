//! Live-server integration tests.
//!
//! These tests talk to a real budget server and require network access.
//! Point `BURSAR_TEST_ENDPOINT`, `BURSAR_TEST_PASSWORD`, and
//! `BURSAR_TEST_FILE` at a test instance, then run with:
//! `cargo test --features integration-tests`

#![cfg(feature = "integration-tests")]

use chrono::Local;
use zeroize::Zeroizing;

use bursar::client::BudgetClient;
use bursar::config::{ConnectionConfig, DEFAULT_UNIT};
use bursar::coordinator::RefreshCoordinator;
use bursar::models::Snapshot;

fn test_config() -> ConnectionConfig {
    let endpoint =
        std::env::var("BURSAR_TEST_ENDPOINT").expect("BURSAR_TEST_ENDPOINT must be set");
    let password =
        std::env::var("BURSAR_TEST_PASSWORD").expect("BURSAR_TEST_PASSWORD must be set");
    let file = std::env::var("BURSAR_TEST_FILE").expect("BURSAR_TEST_FILE must be set");
    ConnectionConfig::new(
        endpoint,
        Zeroizing::new(password),
        file,
        DEFAULT_UNIT,
        None,
        None,
    )
    .expect("test connection config should be valid")
}

#[tokio::test]
async fn open_fetch_and_close_a_session() {
    let client = BudgetClient::new(test_config()).expect("failed to build client");
    let session = client.open().await.expect("failed to open session");

    let accounts = session
        .fetch_accounts()
        .await
        .expect("failed to fetch accounts");
    let budgets = session
        .fetch_budgets(Local::now().date_naive())
        .await
        .expect("failed to fetch budgets");
    session.close().await;

    let snapshot = Snapshot::from_raw(accounts, budgets);
    assert!(!snapshot.accounts.is_empty(), "test file has no accounts");
}

#[tokio::test]
async fn coordinator_first_refresh_against_live_server() {
    let client = BudgetClient::new(test_config()).expect("failed to build client");
    let coordinator = RefreshCoordinator::new(client);

    coordinator
        .first_refresh()
        .await
        .expect("initial refresh failed");
    assert!(coordinator.handle().has_data());
}
