//! Account records.

use rust_decimal::Decimal;
use serde::Serialize;

/// One on- or off-budget account with its current balance.
///
/// The balance is the authoritative snapshot value fetched from the server;
/// it is never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Server-assigned account identifier, stable across refreshes.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current balance (signed).
    pub balance: Decimal,
}
