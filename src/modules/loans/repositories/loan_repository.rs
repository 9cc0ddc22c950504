// MySQL persistence for loans.
//
// - Single and batch insert (batch runs inside one transaction)
// - Owner-scoped listing with optional paid filter
// - Paid-state updates, full-row update, hard delete
// - Active recurring-interest loan listing

use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::loans::models::{InterestType, Loan, PeriodRule};

/// Repository for loan database operations
pub struct LoanRepository {
    pool: MySqlPool,
}

impl LoanRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, loan: &Loan) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        self.insert_with_tx(&mut tx, loan).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    /// Insert a batch of loans atomically: either every loan is
    /// persisted or none of them are.
    pub async fn insert_batch(&self, loans: &[Loan]) -> Result<()> {
        if loans.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        for loan in loans {
            self.insert_with_tx(&mut tx, loan).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    /// Insert a single loan within an open transaction
    pub async fn insert_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        loan: &Loan,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO loans (
                id, user_id, borrower_name, amount, category_id, transaction_id,
                due_date, description, notes, interest_rate, interest_type,
                period_rule, market_reference, expected_profit,
                is_recurring_interest, recurring_interest_day, is_paid,
                paid_date, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&loan.id)
        .bind(&loan.user_id)
        .bind(&loan.borrower_name)
        .bind(loan.amount)
        .bind(&loan.category_id)
        .bind(&loan.transaction_id)
        .bind(loan.due_date)
        .bind(&loan.description)
        .bind(&loan.notes)
        .bind(loan.interest_rate)
        .bind(loan.interest_type.map(|t| t.to_string()))
        .bind(loan.period_rule.map(|p| p.to_string()))
        .bind(loan.market_reference)
        .bind(loan.expected_profit)
        .bind(loan.is_recurring_interest)
        .bind(loan.recurring_interest_day)
        .bind(loan.is_paid)
        .bind(loan.paid_date)
        .bind(loan.created_at)
        .execute(tx.as_mut())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to insert loan: {}", e)))?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Loan>> {
        let row = sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT id, user_id, borrower_name, amount, category_id, transaction_id,
                   due_date, description, notes, interest_rate, interest_type,
                   period_rule, market_reference, expected_profit,
                   is_recurring_interest, recurring_interest_day, is_paid,
                   paid_date, created_at
            FROM loans
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch loan: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }

    /// All of an owner's loans, optionally filtered by paid state,
    /// ordered by due date.
    pub async fn find_by_owner(&self, user_id: &str, is_paid: Option<bool>) -> Result<Vec<Loan>> {
        let rows = match is_paid {
            Some(flag) => {
                sqlx::query_as::<_, LoanRow>(
                    r#"
                    SELECT id, user_id, borrower_name, amount, category_id, transaction_id,
                           due_date, description, notes, interest_rate, interest_type,
                           period_rule, market_reference, expected_profit,
                           is_recurring_interest, recurring_interest_day, is_paid,
                           paid_date, created_at
                    FROM loans
                    WHERE user_id = ? AND is_paid = ?
                    ORDER BY due_date ASC
                    "#,
                )
                .bind(user_id)
                .bind(flag)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, LoanRow>(
                    r#"
                    SELECT id, user_id, borrower_name, amount, category_id, transaction_id,
                           due_date, description, notes, interest_rate, interest_type,
                           period_rule, market_reference, expected_profit,
                           is_recurring_interest, recurring_interest_day, is_paid,
                           paid_date, created_at
                    FROM loans
                    WHERE user_id = ?
                    ORDER BY due_date ASC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::Internal(format!("Failed to fetch loans: {}", e)))?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }

    /// Unpaid loans configured for recurring interest, ordered by due date.
    pub async fn find_recurring_active(&self, user_id: &str) -> Result<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT id, user_id, borrower_name, amount, category_id, transaction_id,
                   due_date, description, notes, interest_rate, interest_type,
                   period_rule, market_reference, expected_profit,
                   is_recurring_interest, recurring_interest_day, is_paid,
                   paid_date, created_at
            FROM loans
            WHERE user_id = ? AND is_recurring_interest = TRUE AND is_paid = FALSE
            ORDER BY due_date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch recurring loans: {}", e)))?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }

    /// Full-row update of mutable loan fields
    pub async fn update(&self, loan: &Loan) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE loans
            SET borrower_name = ?,
                amount = ?,
                category_id = ?,
                transaction_id = ?,
                due_date = ?,
                description = ?,
                notes = ?,
                interest_rate = ?,
                interest_type = ?,
                period_rule = ?,
                market_reference = ?,
                expected_profit = ?,
                is_recurring_interest = ?,
                recurring_interest_day = ?,
                is_paid = ?,
                paid_date = ?,
                created_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&loan.borrower_name)
        .bind(loan.amount)
        .bind(&loan.category_id)
        .bind(&loan.transaction_id)
        .bind(loan.due_date)
        .bind(&loan.description)
        .bind(&loan.notes)
        .bind(loan.interest_rate)
        .bind(loan.interest_type.map(|t| t.to_string()))
        .bind(loan.period_rule.map(|p| p.to_string()))
        .bind(loan.market_reference)
        .bind(loan.expected_profit)
        .bind(loan.is_recurring_interest)
        .bind(loan.recurring_interest_day)
        .bind(loan.is_paid)
        .bind(loan.paid_date)
        .bind(loan.created_at)
        .bind(&loan.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update loan: {}", e)))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found("Loan not found"));
        }

        Ok(())
    }

    /// Link a loan to the ledger transaction that settled it, inside an
    /// open transaction.
    pub async fn link_transaction_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        loan_id: &str,
        transaction_id: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE loans SET transaction_id = ? WHERE id = ?")
            .bind(transaction_id)
            .bind(loan_id)
            .execute(tx.as_mut())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to link loan: {}", e)))?;

        Ok(())
    }

    /// Hard delete
    pub async fn delete(&self, id: &str) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM loans WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete loan: {}", e)))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found("Loan not found"));
        }

        Ok(())
    }
}

/// Database row representation for the loans table
#[derive(sqlx::FromRow)]
struct LoanRow {
    id: String,
    user_id: String,
    borrower_name: String,
    amount: rust_decimal::Decimal,
    category_id: String,
    transaction_id: Option<String>,
    due_date: chrono::NaiveDateTime,
    description: Option<String>,
    notes: Option<String>,
    interest_rate: Option<rust_decimal::Decimal>,
    interest_type: Option<String>,
    period_rule: Option<String>,
    market_reference: Option<rust_decimal::Decimal>,
    expected_profit: Option<rust_decimal::Decimal>,
    is_recurring_interest: bool,
    recurring_interest_day: Option<i32>,
    is_paid: bool,
    paid_date: Option<chrono::NaiveDateTime>,
    created_at: chrono::NaiveDateTime,
}

impl TryFrom<LoanRow> for Loan {
    type Error = AppError;

    fn try_from(row: LoanRow) -> Result<Self> {
        let interest_type = row
            .interest_type
            .map(InterestType::try_from)
            .transpose()
            .map_err(AppError::Internal)?;

        let period_rule = row
            .period_rule
            .map(PeriodRule::try_from)
            .transpose()
            .map_err(AppError::Internal)?;

        Ok(Loan {
            id: row.id,
            user_id: row.user_id,
            borrower_name: row.borrower_name,
            amount: row.amount,
            category_id: row.category_id,
            transaction_id: row.transaction_id,
            due_date: row.due_date,
            description: row.description,
            notes: row.notes,
            interest_rate: row.interest_rate,
            interest_type,
            period_rule,
            market_reference: row.market_reference,
            expected_profit: row.expected_profit,
            is_recurring_interest: row.is_recurring_interest,
            recurring_interest_day: row.recurring_interest_day,
            is_paid: row.is_paid,
            paid_date: row.paid_date,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn row() -> LoanRow {
        LoanRow {
            id: "loan-001".to_string(),
            user_id: "user-001".to_string(),
            borrower_name: "Alice".to_string(),
            amount: Decimal::new(50000, 2),
            category_id: "cat-001".to_string(),
            transaction_id: None,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            description: None,
            notes: None,
            interest_rate: Some(Decimal::new(2, 0)),
            interest_type: Some("COMPOUND".to_string()),
            period_rule: Some("MENSAL".to_string()),
            market_reference: None,
            expected_profit: None,
            is_recurring_interest: false,
            recurring_interest_day: None,
            is_paid: false,
            paid_date: None,
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_loan_row_conversion() {
        let loan: Loan = row().try_into().unwrap();
        assert_eq!(loan.id, "loan-001");
        assert_eq!(loan.interest_type, Some(InterestType::Compound));
        assert_eq!(loan.period_rule, Some(PeriodRule::Monthly));
    }

    #[test]
    fn test_invalid_interest_type_is_rejected() {
        let mut bad = row();
        bad.interest_type = Some("HYPERBOLIC".to_string());
        let result: Result<Loan> = bad.try_into();
        assert!(result.is_err());
    }
}
