//! Normalized domain records published by the coordinator.
//!
//! Everything past the session adapter works with these flat value types;
//! raw server shapes (see [`crate::client::wire`]) never leave the
//! normalization boundary in [`snapshot`].

pub mod account;
pub mod budget;
pub mod snapshot;

pub use account::Account;
pub use budget::BudgetLine;
pub use snapshot::Snapshot;
