use sqlx::{MySql, MySqlPool, Transaction as SqlTransaction};

use crate::core::{AppError, Result};
use crate::modules::transactions::models::Transaction;

/// Repository for ledger transaction lookups and classification updates
pub struct TransactionRepository {
    pool: MySqlPool,
}

impl TransactionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Transaction>> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, value, description, notes, category_id,
                   is_classified, deleted_at, created_at
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch transaction: {}", e)))
    }

    /// Apply a classification inside an open transaction, so it commits
    /// or rolls back together with the payment and loan writes.
    pub async fn classify_with_tx(
        &self,
        tx: &mut SqlTransaction<'_, MySql>,
        id: &str,
        category_id: &str,
        notes: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET category_id = ?, is_classified = TRUE, notes = COALESCE(?, notes)
            WHERE id = ?
            "#,
        )
        .bind(category_id)
        .bind(notes)
        .bind(id)
        .execute(tx.as_mut())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to classify transaction: {}", e)))?;

        Ok(())
    }
}
