use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::loans::models::LoanPayment;

/// Repository for loan payment rows
pub struct LoanPaymentRepository {
    pool: MySqlPool,
}

impl LoanPaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert a payment within an open transaction. Payments are only
    /// ever written as part of the classification unit.
    pub async fn insert_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        payment: &LoanPayment,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loan_payments (id, loan_id, transaction_id, amount, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.loan_id)
        .bind(&payment.transaction_id)
        .bind(payment.amount)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .execute(tx.as_mut())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to insert loan payment: {}", e)))?;

        Ok(())
    }

    /// Every payment across an owner's loans, oldest first.
    pub async fn find_by_owner(&self, user_id: &str) -> Result<Vec<LoanPayment>> {
        sqlx::query_as::<_, LoanPayment>(
            r#"
            SELECT p.id, p.loan_id, p.transaction_id, p.amount, p.notes, p.created_at
            FROM loan_payments p
            INNER JOIN loans l ON l.id = p.loan_id
            WHERE l.user_id = ?
            ORDER BY p.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch loan payments: {}", e)))
    }
}
