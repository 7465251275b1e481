//! Budget server polling bridge.
//!
//! Polls an Actual-style personal-finance server for account balances and
//! category budgets on a fixed one-hour cadence and republishes them as
//! read-only monetary sensors for a home-automation hub. The pieces, leaf
//! to root: a session-scoped HTTP adapter ([`client`]), a pure
//! normalization boundary ([`models::snapshot`]), a scheduled refresh
//! coordinator owning the cached snapshot ([`coordinator`]), passive sensor
//! entities ([`sensor`]), and a one-shot connection setup wizard
//! ([`setup`]).

pub mod client;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod error;
pub mod models;
pub mod sensor;
pub mod setup;
pub mod tls;

pub use error::{BursarError, Result};
