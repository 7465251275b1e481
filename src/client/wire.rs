//! Raw wire shapes for the budget server's JSON API.
//!
//! Every response body is wrapped in an [`Envelope`] carrying
//! `{"status": "ok" | "error", "reason"?, "data"?}`. Monetary amounts are
//! integer minor units (cents); they are converted to decimals only at the
//! normalization boundary ([`crate::models::snapshot`]).

use serde::{Deserialize, Serialize};

use crate::Result;

/// Standard response envelope used by every server endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps the payload, mapping server-side error reasons to typed
    /// failures.
    ///
    /// # Errors
    ///
    /// Returns [`BursarError::Auth`](crate::BursarError::Auth) for credential
    /// rejections, [`BursarError::InvalidDataset`](crate::BursarError::InvalidDataset)
    /// for file-level reasons, and
    /// [`BursarError::Connection`](crate::BursarError::Connection) otherwise.
    pub fn into_result(self) -> Result<T> {
        if self.status != "ok" {
            let reason = self.reason.unwrap_or_else(|| "unknown".to_string());
            return Err(match reason.as_str() {
                "invalid-password" | "unauthorized" | "token-expired" => {
                    crate::BursarError::Auth(format!("server rejected request: {reason}"))
                }
                "file-not-found" | "file-has-new-key" | "file-needs-upload" => {
                    crate::BursarError::InvalidDataset(format!("server rejected file: {reason}"))
                }
                _ => crate::BursarError::Connection(format!("server error: {reason}")),
            });
        }
        self.data.ok_or_else(|| {
            crate::BursarError::Connection("server response missing data payload".to_string())
        })
    }
}

/// Body for `POST /account/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub password: &'a str,
}

/// Payload of a successful login: the session token.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: String,
}

/// One budget file as listed by `GET /sync/list-user-files`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFile {
    pub file_id: String,
    pub name: String,
    /// Present when the file is end-to-end encrypted.
    #[serde(default)]
    pub encrypt_key_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

/// One account row from `GET /budgets/{file}/accounts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub id: String,
    pub name: String,
    /// Balance in minor units (cents), signed.
    pub balance: i64,
    #[serde(default)]
    pub closed: bool,
}

/// Category group reference embedded in a budget row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// Category embedded in a budget row. `group` may be unresolved when the
/// server returns an orphaned category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group: Option<GroupRef>,
}

/// One budget row from `GET /budgets/{file}/months/{month}`.
///
/// `category` is `None` for rows whose category was deleted server-side;
/// the normalizer drops those.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRecord {
    #[serde(default)]
    pub category: Option<CategoryRecord>,
    pub month: String,
    /// Budgeted amount in minor units.
    pub budgeted: i64,
    /// Spent amount in minor units, negative for expenditure.
    pub spent: i64,
}

/// Payload of `GET /budgets/{file}/months/{month}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthData {
    pub month: String,
    pub budgets: Vec<BudgetRecord>,
}

/// Everything one refresh fetches before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawSnapshot {
    pub accounts: Vec<AccountRecord>,
    pub budgets: Vec<BudgetRecord>,
}
