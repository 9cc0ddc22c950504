use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A partial or full payment recorded against a loan.
///
/// Payments are not capped at the loan principal; the summary layer
/// surfaces shortfalls and overpayments instead of blocking them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoanPayment {
    pub id: String,
    pub loan_id: String,
    /// Ledger transaction backing this payment, if any
    pub transaction_id: Option<String>,
    pub amount: Decimal,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl LoanPayment {
    pub fn new(
        loan_id: String,
        transaction_id: Option<String>,
        amount: Decimal,
        notes: Option<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            loan_id,
            transaction_id,
            amount,
            notes,
            created_at: now,
        }
    }
}
