//! Budget line records.

use rust_decimal::Decimal;
use serde::Serialize;

/// One category's budgeted vs. spent amounts for a given month.
///
/// `budgeted` and `spent` are kept raw (no precomputed remainder) so the
/// publisher derives display values without precision loss. Expenditure
/// arrives as negative amounts on the wire, but [`remaining`](Self::remaining)
/// is sign-convention agnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    /// Category identifier, stable across refreshes.
    pub id: String,
    /// Category display name.
    pub name: String,
    /// Name of the category group this line belongs to.
    pub group: String,
    /// Month label in `YYYY-MM` form.
    pub month: String,
    /// Amount budgeted for the month.
    pub budgeted: Decimal,
    /// Amount spent in the month (signed).
    pub spent: Decimal,
}

impl BudgetLine {
    /// Amount left to spend: `budgeted - |spent|`.
    pub fn remaining(&self) -> Decimal {
        self.budgeted - self.spent.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(budgeted: Decimal, spent: Decimal) -> BudgetLine {
        BudgetLine {
            id: "cat-1".to_string(),
            name: "Groceries".to_string(),
            group: "Usual Expenses".to_string(),
            month: "2026-08".to_string(),
            budgeted,
            spent,
        }
    }

    #[test]
    fn remaining_with_negative_spent() {
        assert_eq!(line(dec!(100), dec!(-40)).remaining(), dec!(60));
    }

    #[test]
    fn remaining_with_positive_spent() {
        assert_eq!(line(dec!(100), dec!(40)).remaining(), dec!(60));
    }

    #[test]
    fn remaining_can_go_negative_when_overspent() {
        assert_eq!(line(dec!(100), dec!(-150.25)).remaining(), dec!(-50.25));
    }
}
