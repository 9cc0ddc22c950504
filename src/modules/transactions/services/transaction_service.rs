// Classification of ledger transactions.
//
// Classifying can also settle loans (payment rows linked to the
// transaction) and open new ones. All of it commits as one unit: the
// classification update, the payments, the loan links, and any created
// loans succeed or fail together.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::categories::CategoryRepository;
use crate::modules::loans::models::{Loan, LoanDraft, LoanPayment};
use crate::modules::loans::repositories::{LoanPaymentRepository, LoanRepository};
use crate::modules::loans::services::LoanBatchItem;
use crate::modules::transactions::models::Transaction;
use crate::modules::transactions::repositories::TransactionRepository;

const DEFAULT_DUE_DAYS: i64 = 7;

/// One loan settled (fully or partially) by the transaction being
/// classified.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyPaymentItem {
    pub loan_id: String,
    pub amount: Decimal,
    pub notes: Option<String>,
}

/// Request to classify a transaction, optionally recording loan payments
/// and opening new loans in the same unit.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyTransactionRequest {
    pub category_id: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub loan_payments: Vec<ClassifyPaymentItem>,
    #[serde(default)]
    pub create_loan: bool,
    pub borrower_name: Option<String>,
    #[serde(default)]
    pub loan_items: Vec<LoanBatchItem>,
}

/// Service for transaction classification business logic
pub struct TransactionService {
    pool: MySqlPool,
    transactions: TransactionRepository,
    categories: CategoryRepository,
    loans: LoanRepository,
    payments: LoanPaymentRepository,
}

impl TransactionService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            transactions: TransactionRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            loans: LoanRepository::new(pool.clone()),
            payments: LoanPaymentRepository::new(pool.clone()),
            pool,
        }
    }

    /// Fetch one transaction, merging foreign ownership into "not found".
    pub async fn get_transaction(&self, id: &str, user_id: &str) -> Result<Transaction> {
        let transaction = self
            .transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Transaction not found"))?;
        transaction.ensure_owned_by(user_id)?;
        Ok(transaction)
    }

    /// Classify a transaction into a category, recording loan payments
    /// and opening loans as requested.
    ///
    /// Validation is fail-fast and happens entirely before the write
    /// section; once writing starts, everything commits or nothing does.
    pub async fn classify(
        &self,
        transaction_id: &str,
        user_id: &str,
        req: ClassifyTransactionRequest,
    ) -> Result<Transaction> {
        let transaction = self.get_transaction(transaction_id, user_id).await?;

        let category = self
            .categories
            .find_by_id(&req.category_id)
            .await?
            .ok_or_else(|| AppError::not_found("Category not found"))?;
        if !category.is_available_to(user_id) {
            return Err(AppError::validation("Category not available"));
        }

        // Payments cannot exceed the transaction's magnitude
        if !req.loan_payments.is_empty() {
            let total: Decimal = req.loan_payments.iter().map(|p| p.amount).sum();
            if total > transaction.value.abs() {
                return Err(AppError::validation(format!(
                    "Total payments ({}) cannot exceed the transaction value ({})",
                    total, transaction.value
                )));
            }
        }

        // Every referenced loan must belong to the caller
        for item in &req.loan_payments {
            let loan = self
                .loans
                .find_by_id(&item.loan_id)
                .await?
                .ok_or_else(|| AppError::not_found("Loan not found"))?;
            loan.ensure_owned_by(user_id)?;
        }

        let now = Utc::now().naive_utc();
        let new_loans = if req.create_loan {
            Self::build_classification_loans(user_id, &transaction, &req, now)?
        } else {
            Vec::new()
        };

        // Atomic write section
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        self.transactions
            .classify_with_tx(&mut tx, transaction_id, &req.category_id, req.notes.as_deref())
            .await?;

        for item in &req.loan_payments {
            let payment = LoanPayment::new(
                item.loan_id.clone(),
                Some(transaction_id.to_string()),
                item.amount,
                item.notes.clone(),
                now,
            );
            self.payments.insert_with_tx(&mut tx, &payment).await?;
            self.loans
                .link_transaction_with_tx(&mut tx, &item.loan_id, transaction_id)
                .await?;
        }

        for loan in &new_loans {
            self.loans.insert_with_tx(&mut tx, loan).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        info!(
            transaction_id,
            payments = req.loan_payments.len(),
            loans_created = new_loans.len(),
            "Transaction classified"
        );

        self.get_transaction(transaction_id, user_id).await
    }

    /// Loans opened alongside a classification. With explicit items, one
    /// loan per item sharing the borrower; otherwise a single loan over
    /// the transaction's full value, due in a week.
    fn build_classification_loans(
        user_id: &str,
        transaction: &Transaction,
        req: &ClassifyTransactionRequest,
        now: chrono::NaiveDateTime,
    ) -> Result<Vec<Loan>> {
        let borrower = req
            .borrower_name
            .clone()
            .unwrap_or_else(|| transaction.description.clone());

        if req.loan_items.is_empty() {
            let draft = LoanDraft {
                borrower_name: borrower,
                amount: transaction.value.abs(),
                category_id: req.category_id.clone(),
                due_date: now + Duration::days(DEFAULT_DUE_DAYS),
                transaction_id: Some(transaction.id.clone()),
                description: Some(format!(
                    "Loan created from transaction: {}",
                    transaction.description
                )),
                notes: req.notes.clone().or_else(|| transaction.notes.clone()),
                interest_rate: None,
                interest_type: None,
                period_rule: None,
                market_reference: None,
                expected_profit: None,
                is_recurring_interest: false,
                recurring_interest_day: None,
                created_at: None,
            };
            return Ok(vec![Loan::from_draft(user_id.to_string(), draft, now)?]);
        }

        let mut loans = Vec::with_capacity(req.loan_items.len());
        for item in &req.loan_items {
            let draft = LoanDraft {
                borrower_name: borrower.clone(),
                amount: item.amount,
                category_id: item.category_id.clone(),
                due_date: item.due_date,
                transaction_id: Some(transaction.id.clone()),
                description: Some(item.description.clone().unwrap_or_else(|| {
                    format!(
                        "Loan installment from transaction: {}",
                        transaction.description
                    )
                })),
                notes: item.notes.clone().or_else(|| transaction.notes.clone()),
                interest_rate: item.interest_rate,
                interest_type: item.interest_type,
                period_rule: item.period_rule,
                market_reference: item.market_reference,
                expected_profit: item.expected_profit,
                is_recurring_interest: item.is_recurring_interest,
                recurring_interest_day: item.recurring_interest_day,
                created_at: item.created_at,
            };
            loans.push(Loan::from_draft(user_id.to_string(), draft, now)?);
        }

        Ok(loans)
    }
}
