//! Refresh coordinator behavior: fatal first refresh, failure retention,
//! wholesale snapshot replacement, and single-flight ticks.

mod common;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use bursar::BursarError;
use bursar::coordinator::RefreshCoordinator;
use bursar::sensor;

use common::{ScriptedSource, account, budget, raw};

#[tokio::test]
async fn first_refresh_failure_is_fatal_and_publishes_nothing() {
    let source = ScriptedSource::new(vec![Err(BursarError::Connection("refused".to_string()))]);
    let coordinator = RefreshCoordinator::new(source);
    let handle = coordinator.handle();

    assert!(coordinator.first_refresh().await.is_err());

    assert!(!handle.has_data());
    let (accounts, budgets) = sensor::build_sensors(&handle, "$");
    assert!(accounts.is_empty());
    assert!(budgets.is_empty());

    let status = coordinator.status();
    assert_eq!(status.consecutive_failures, 1);
    assert!(status.last_success.is_none());
    assert!(status.last_error.is_some());
}

#[tokio::test]
async fn failure_after_success_retains_previous_snapshot() {
    let source = ScriptedSource::new(vec![
        Ok(raw(vec![account("a1", "Checking", 25000)], vec![])),
        Err(BursarError::Auth("token expired".to_string())),
    ]);
    let coordinator = RefreshCoordinator::new(source);
    let handle = coordinator.handle();

    coordinator.first_refresh().await.unwrap();
    assert_eq!(
        handle.current().unwrap().accounts["a1"].balance,
        dec!(250.00)
    );

    assert!(coordinator.refresh_once().await.is_err());

    // The cached snapshot is unchanged and readers keep serving it.
    assert_eq!(
        handle.current().unwrap().accounts["a1"].balance,
        dec!(250.00)
    );
    let status = coordinator.status();
    assert_eq!(status.consecutive_failures, 1);
    assert!(status.last_success.is_some());
}

#[tokio::test]
async fn success_clears_failure_bookkeeping() {
    let source = ScriptedSource::new(vec![
        Ok(raw(vec![account("a1", "Checking", 100)], vec![])),
        Err(BursarError::Connection("blip".to_string())),
        Ok(raw(vec![account("a1", "Checking", 200)], vec![])),
    ]);
    let coordinator = RefreshCoordinator::new(source);

    coordinator.first_refresh().await.unwrap();
    let _ = coordinator.refresh_once().await;
    coordinator.refresh_once().await.unwrap();

    let status = coordinator.status();
    assert_eq!(status.consecutive_failures, 0);
    assert!(status.last_error.is_none());
}

#[tokio::test]
async fn refresh_replaces_snapshot_wholesale() {
    let source = ScriptedSource::new(vec![
        Ok(raw(
            vec![account("a1", "Checking", 10000)],
            vec![budget("b1", "Groceries", "Usual Expenses", 30000, -12050)],
        )),
        Ok(raw(vec![account("a2", "Savings", 5000)], vec![])),
    ]);
    let coordinator = RefreshCoordinator::new(source);
    let handle = coordinator.handle();

    coordinator.first_refresh().await.unwrap();
    coordinator.refresh_once().await.unwrap();

    let snapshot = handle.current().unwrap();
    assert!(!snapshot.accounts.contains_key("a1"));
    assert!(snapshot.budgets.is_empty());
    assert_eq!(snapshot.accounts["a2"].balance, dec!(50.00));
}

#[tokio::test]
async fn concurrent_ticks_coalesce_to_one_fetch() {
    let source = ScriptedSource::new(vec![Ok(raw(
        vec![account("a1", "Checking", 100)],
        vec![],
    ))])
    .with_delay(Duration::from_millis(50));
    let coordinator = Arc::new(RefreshCoordinator::new(source));

    let first = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.refresh_once().await })
    };
    // Give the first refresh time to take the gate, then tick again.
    tokio::time::sleep(Duration::from_millis(10)).await;
    coordinator.refresh_once().await.unwrap();

    first.await.unwrap().unwrap();
    // The second tick was skipped, not queued.
    assert_eq!(coordinator.source().fetch_count(), 1);
    assert!(coordinator.handle().has_data());
}

#[tokio::test]
async fn run_loop_publishes_new_snapshots() {
    let source = ScriptedSource::new(vec![
        Ok(raw(vec![account("a1", "Checking", 100)], vec![])),
        Ok(raw(vec![account("a1", "Checking", 200)], vec![])),
    ]);
    let coordinator = Arc::new(RefreshCoordinator::with_interval(
        source,
        Duration::from_millis(20),
    ));

    coordinator.first_refresh().await.unwrap();
    let mut handle = coordinator.handle();

    let runner = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.run().await })
    };

    assert!(handle.changed().await);
    assert_eq!(
        handle.current().unwrap().accounts["a1"].balance,
        dec!(2.00)
    );

    runner.abort();
}
