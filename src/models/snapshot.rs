//! Snapshot assembly: the normalization boundary.
//!
//! [`Snapshot::from_raw`] is the only place raw server records are turned
//! into domain records, and the only place wire minor units become
//! [`Decimal`] amounts. Budget rows whose category link (or category group)
//! cannot be resolved are dropped here, silently except for a debug count.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::client::wire::{AccountRecord, BudgetRecord};
use crate::models::{Account, BudgetLine};

/// The complete set of accounts and budget lines from one refresh cycle.
///
/// Built wholesale per refresh and swapped atomically by the coordinator;
/// readers never observe a partially updated snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Accounts keyed by server id.
    pub accounts: HashMap<String, Account>,
    /// Budget lines keyed by category id.
    pub budgets: HashMap<String, BudgetLine>,
}

impl Snapshot {
    /// Normalizes raw server records into a snapshot.
    ///
    /// Pure: no I/O, no clock. Identifiers are carried over verbatim so
    /// sensor identity stays stable across refreshes.
    pub fn from_raw(accounts: Vec<AccountRecord>, budgets: Vec<BudgetRecord>) -> Self {
        let accounts: HashMap<String, Account> = accounts
            .into_iter()
            .map(|raw| {
                (
                    raw.id.clone(),
                    Account {
                        id: raw.id,
                        name: raw.name,
                        balance: from_minor_units(raw.balance),
                    },
                )
            })
            .collect();

        let total_rows = budgets.len();
        let budgets: HashMap<String, BudgetLine> = budgets
            .into_iter()
            .filter_map(|raw| {
                let category = raw.category?;
                let group = category.group?;
                Some((
                    category.id.clone(),
                    BudgetLine {
                        id: category.id,
                        name: category.name,
                        group: group.name,
                        month: raw.month,
                        budgeted: from_minor_units(raw.budgeted),
                        spent: from_minor_units(raw.spent),
                    },
                ))
            })
            .collect();

        if budgets.len() < total_rows {
            debug!(
                dropped = total_rows - budgets.len(),
                kept = budgets.len(),
                "dropped budget rows with unresolved category links"
            );
        }

        Self { accounts, budgets }
    }
}

/// Converts wire minor units (cents) into a two-decimal amount.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
