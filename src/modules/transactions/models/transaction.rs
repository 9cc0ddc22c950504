use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};

/// Ledger transaction. Signed: expenses are negative, income positive.
///
/// Transactions are soft-deleted with a `deleted_at` tombstone, unlike
/// loans which are removed outright.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub value: Decimal,
    pub description: String,
    pub notes: Option<String>,
    pub category_id: Option<String>,
    pub is_classified: bool,
    pub deleted_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Transaction {
    /// Ownership check with the not-found merge used everywhere in the
    /// service: a foreign transaction reads as missing.
    pub fn ensure_owned_by(&self, user_id: &str) -> Result<()> {
        if self.user_id != user_id {
            return Err(AppError::not_found("Transaction not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ownership_merge() {
        let tx = Transaction {
            id: "tx-1".to_string(),
            user_id: "user-a".to_string(),
            value: dec!(-120.50),
            description: "Mercado".to_string(),
            notes: None,
            category_id: None,
            is_classified: false,
            deleted_at: None,
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };

        assert!(tx.ensure_owned_by("user-a").is_ok());
        let err = tx.ensure_owned_by("user-b").unwrap_err();
        assert_eq!(err.to_string(), "Not found: Transaction not found");
    }
}
