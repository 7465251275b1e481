//! Shared test utilities: scripted snapshot sources and record builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;

use bursar::client::wire::{
    AccountRecord, BudgetRecord, CategoryRecord, GroupRef, RawSnapshot,
};
use bursar::coordinator::SnapshotSource;
use bursar::{BursarError, Result};

/// Builds an account wire record with a minor-unit balance.
pub fn account(id: &str, name: &str, balance: i64) -> AccountRecord {
    AccountRecord {
        id: id.to_string(),
        name: name.to_string(),
        balance,
        closed: false,
    }
}

/// Builds a budget wire record with a fully resolved category link.
pub fn budget(category_id: &str, name: &str, group: &str, budgeted: i64, spent: i64) -> BudgetRecord {
    BudgetRecord {
        category: Some(CategoryRecord {
            id: category_id.to_string(),
            name: name.to_string(),
            group: Some(GroupRef {
                id: format!("group-{group}"),
                name: group.to_string(),
            }),
        }),
        month: "2026-08".to_string(),
        budgeted,
        spent,
    }
}

/// Builds a budget wire record whose category link is unresolved.
pub fn orphan_budget(budgeted: i64, spent: i64) -> BudgetRecord {
    BudgetRecord {
        category: None,
        month: "2026-08".to_string(),
        budgeted,
        spent,
    }
}

pub fn raw(accounts: Vec<AccountRecord>, budgets: Vec<BudgetRecord>) -> RawSnapshot {
    RawSnapshot { accounts, budgets }
}

/// Scripted snapshot source: yields one queued result per fetch, counts
/// calls, and optionally holds every fetch open for a fixed delay.
pub struct ScriptedSource {
    results: Mutex<VecDeque<Result<RawSnapshot>>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(results: Vec<Result<RawSnapshot>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Makes every fetch take at least `delay` before resolving.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SnapshotSource for ScriptedSource {
    fn fetch<'a>(
        &'a self,
        _as_of: NaiveDate,
    ) -> Pin<Box<dyn Future<Output = Result<RawSnapshot>> + Send + 'a>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BursarError::Connection("script exhausted".to_string())))
        })
    }
}
