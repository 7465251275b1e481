//! Read-only sensor entities over the cached snapshot.
//!
//! One sensor is materialized per account and per budget line present in
//! the snapshot at setup time. Sensors are passive: they never trigger a
//! refresh, and every value read reflects the latest cached snapshot, not
//! the one they were created from. Records that first appear in a later
//! snapshot get no sensor until the process restarts; records that
//! disappear make their sensor report no value.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::coordinator::SnapshotHandle;
use crate::models::{Account, BudgetLine};

/// Identifier prefix for everything this bridge publishes.
pub const DOMAIN: &str = "bursar";

/// Icon hint for the home-automation hub.
pub const DEFAULT_ICON: &str = "mdi:bank";

/// Monetary device classification.
pub const DEVICE_CLASS_MONETARY: &str = "monetary";

/// Measurement state classification.
pub const STATE_CLASS_MEASUREMENT: &str = "measurement";

/// Common observable surface of a published sensor.
pub trait Sensor {
    /// Display label.
    fn name(&self) -> &str;

    /// Stable identity string, `"{domain}-{kind}-{id}"` lower-cased.
    fn unique_id(&self) -> &str;

    /// Display unit symbol from the connection config.
    fn unit_of_measurement(&self) -> &str;

    fn device_class(&self) -> &'static str {
        DEVICE_CLASS_MONETARY
    }

    fn state_class(&self) -> &'static str {
        STATE_CLASS_MEASUREMENT
    }

    fn icon(&self) -> &'static str {
        DEFAULT_ICON
    }

    /// A sensor is available as soon as any snapshot exists.
    fn available(&self) -> bool;

    /// Current numeric value, `None` when the backing record is missing
    /// from the latest snapshot.
    fn value(&self) -> Option<Decimal>;
}

/// Sensor publishing one account's balance.
pub struct AccountSensor {
    handle: SnapshotHandle,
    account_id: String,
    name: String,
    unique_id: String,
    unit: String,
}

impl AccountSensor {
    fn new(handle: SnapshotHandle, account: &Account, unit: &str) -> Self {
        Self {
            handle,
            account_id: account.id.clone(),
            name: format!("Account: {}", account.name),
            unique_id: format!("{DOMAIN}-account-{}", account.id).to_lowercase(),
            unit: unit.to_string(),
        }
    }
}

impl Sensor for AccountSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn unit_of_measurement(&self) -> &str {
        &self.unit
    }

    fn available(&self) -> bool {
        self.handle.has_data()
    }

    fn value(&self) -> Option<Decimal> {
        let snapshot = self.handle.current()?;
        Some(snapshot.accounts.get(&self.account_id)?.balance)
    }
}

/// Extra attributes published alongside a budget sensor's value.
///
/// `balance` repeats the remaining value for hub-side templating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAttributes {
    pub spent: Decimal,
    pub budgeted: Decimal,
    pub balance: Decimal,
}

/// Sensor publishing one budget line's remaining amount.
pub struct BudgetSensor {
    handle: SnapshotHandle,
    budget_id: String,
    name: String,
    unique_id: String,
    unit: String,
}

impl BudgetSensor {
    fn new(handle: SnapshotHandle, budget: &BudgetLine, unit: &str) -> Self {
        Self {
            handle,
            budget_id: budget.id.clone(),
            name: format!("Budget: {}", budget.name),
            unique_id: format!("{DOMAIN}-budget-{}", budget.id).to_lowercase(),
            unit: unit.to_string(),
        }
    }

    /// Spent/budgeted/remaining breakdown from the latest snapshot.
    pub fn attributes(&self) -> Option<BudgetAttributes> {
        let snapshot = self.handle.current()?;
        let line = snapshot.budgets.get(&self.budget_id)?;
        Some(BudgetAttributes {
            spent: line.spent,
            budgeted: line.budgeted,
            balance: line.remaining(),
        })
    }
}

impl Sensor for BudgetSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn unit_of_measurement(&self) -> &str {
        &self.unit
    }

    fn available(&self) -> bool {
        self.handle.has_data()
    }

    fn value(&self) -> Option<Decimal> {
        let snapshot = self.handle.current()?;
        Some(snapshot.budgets.get(&self.budget_id)?.remaining())
    }
}

/// Materializes one sensor per record in the snapshot current at call time.
///
/// Returns empty vectors when no snapshot exists yet; callers run the
/// mandatory initial refresh first.
pub fn build_sensors(
    handle: &SnapshotHandle,
    unit: &str,
) -> (Vec<AccountSensor>, Vec<BudgetSensor>) {
    let Some(snapshot) = handle.current() else {
        return (Vec::new(), Vec::new());
    };

    let mut accounts: Vec<AccountSensor> = snapshot
        .accounts
        .values()
        .map(|account| AccountSensor::new(handle.clone(), account, unit))
        .collect();
    accounts.sort_by(|a, b| a.unique_id.cmp(&b.unique_id));

    let mut budgets: Vec<BudgetSensor> = snapshot
        .budgets
        .values()
        .map(|budget| BudgetSensor::new(handle.clone(), budget, unit))
        .collect();
    budgets.sort_by(|a, b| a.unique_id.cmp(&b.unique_id));

    (accounts, budgets)
}
