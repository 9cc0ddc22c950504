use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::loans::models::RecurringInterestPayment;

/// A recurring installment joined with its loan's borrower, for the
/// month-by-month summary view.
#[derive(Debug, Clone)]
pub struct RecurringInterestWithLoan {
    pub payment: RecurringInterestPayment,
    pub borrower_name: String,
}

/// Repository for recurring interest installment rows
pub struct RecurringInterestRepository {
    pool: MySqlPool,
}

impl RecurringInterestRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, payment: &RecurringInterestPayment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recurring_interest_payments (
                id, loan_id, reference_month, amount, is_paid, paid_date,
                transaction_id, notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.loan_id)
        .bind(payment.reference_month)
        .bind(payment.amount)
        .bind(payment.is_paid)
        .bind(payment.paid_date)
        .bind(&payment.transaction_id)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!("Failed to insert recurring interest payment: {}", e))
        })?;

        Ok(())
    }

    pub async fn update(&self, payment: &RecurringInterestPayment) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE recurring_interest_payments
            SET amount = ?, is_paid = ?, paid_date = ?, transaction_id = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(payment.amount)
        .bind(payment.is_paid)
        .bind(payment.paid_date)
        .bind(&payment.transaction_id)
        .bind(&payment.notes)
        .bind(&payment.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!("Failed to update recurring interest payment: {}", e))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found("Recurring interest payment not found"));
        }

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<RecurringInterestPayment>> {
        sqlx::query_as::<_, RecurringInterestPayment>(
            r#"
            SELECT id, loan_id, reference_month, amount, is_paid, paid_date,
                   transaction_id, notes, created_at
            FROM recurring_interest_payments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!("Failed to fetch recurring interest payment: {}", e))
        })
    }

    /// Lookup by the (loan, reference month) natural key.
    pub async fn find_by_loan_and_month(
        &self,
        loan_id: &str,
        reference_month: NaiveDate,
    ) -> Result<Option<RecurringInterestPayment>> {
        sqlx::query_as::<_, RecurringInterestPayment>(
            r#"
            SELECT id, loan_id, reference_month, amount, is_paid, paid_date,
                   transaction_id, notes, created_at
            FROM recurring_interest_payments
            WHERE loan_id = ? AND reference_month = ?
            "#,
        )
        .bind(loan_id)
        .bind(reference_month)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!("Failed to fetch recurring interest payment: {}", e))
        })
    }

    /// Reference months that already have a row for this loan. Feeds the
    /// generator's lookup-before-create pass.
    pub async fn find_months_by_loan(&self, loan_id: &str) -> Result<Vec<NaiveDate>> {
        let rows: Vec<(NaiveDate,)> = sqlx::query_as(
            r#"
            SELECT reference_month
            FROM recurring_interest_payments
            WHERE loan_id = ?
            ORDER BY reference_month ASC
            "#,
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch reference months: {}", e)))?;

        Ok(rows.into_iter().map(|(month,)| month).collect())
    }

    /// Unpaid installments across an owner's loans, earliest month first.
    pub async fn find_unpaid_by_owner(
        &self,
        user_id: &str,
    ) -> Result<Vec<RecurringInterestPayment>> {
        sqlx::query_as::<_, RecurringInterestPayment>(
            r#"
            SELECT r.id, r.loan_id, r.reference_month, r.amount, r.is_paid,
                   r.paid_date, r.transaction_id, r.notes, r.created_at
            FROM recurring_interest_payments r
            INNER JOIN loans l ON l.id = r.loan_id
            WHERE l.user_id = ? AND r.is_paid = FALSE
            ORDER BY r.reference_month ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!("Failed to fetch pending recurring interest: {}", e))
        })
    }

    /// All installments across an owner's loans.
    pub async fn find_by_owner(&self, user_id: &str) -> Result<Vec<RecurringInterestPayment>> {
        sqlx::query_as::<_, RecurringInterestPayment>(
            r#"
            SELECT r.id, r.loan_id, r.reference_month, r.amount, r.is_paid,
                   r.paid_date, r.transaction_id, r.notes, r.created_at
            FROM recurring_interest_payments r
            INNER JOIN loans l ON l.id = r.loan_id
            WHERE l.user_id = ?
            ORDER BY r.reference_month ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch recurring interest: {}", e)))
    }

    /// Installments since a starting month, joined with borrower names,
    /// earliest month first.
    pub async fn find_by_owner_since(
        &self,
        user_id: &str,
        start: NaiveDate,
    ) -> Result<Vec<RecurringInterestWithLoan>> {
        let rows = sqlx::query_as::<_, RecurringWithLoanRow>(
            r#"
            SELECT r.id, r.loan_id, r.reference_month, r.amount, r.is_paid,
                   r.paid_date, r.transaction_id, r.notes, r.created_at,
                   l.borrower_name
            FROM recurring_interest_payments r
            INNER JOIN loans l ON l.id = r.loan_id
            WHERE l.user_id = ? AND r.reference_month >= ?
            ORDER BY r.reference_month ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::Internal(format!("Failed to fetch recurring interest summary: {}", e))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| RecurringInterestWithLoan {
                payment: RecurringInterestPayment {
                    id: row.id,
                    loan_id: row.loan_id,
                    reference_month: row.reference_month,
                    amount: row.amount,
                    is_paid: row.is_paid,
                    paid_date: row.paid_date,
                    transaction_id: row.transaction_id,
                    notes: row.notes,
                    created_at: row.created_at,
                },
                borrower_name: row.borrower_name,
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct RecurringWithLoanRow {
    id: String,
    loan_id: String,
    reference_month: NaiveDate,
    amount: rust_decimal::Decimal,
    is_paid: bool,
    paid_date: Option<chrono::NaiveDateTime>,
    transaction_id: Option<String>,
    notes: Option<String>,
    created_at: chrono::NaiveDateTime,
    borrower_name: String,
}
