// Business logic for the loan lifecycle.
//
// - Creation (direct, from a ledger transaction, and batch)
// - Ownership-scoped reads with derived balances
// - Paid-state transitions and hard deletes
// - Aggregate summary and interest earnings

use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::info;

use crate::core::money::round_cents;
use crate::core::{AppError, Result};
use crate::modules::categories::{Category, CategoryRepository};
use crate::modules::loans::models::{
    InterestType, Loan, LoanDraft, LoanPayment, PeriodRule, RecurringInterestPayment,
};
use crate::modules::loans::repositories::{
    LoanPaymentRepository, LoanRepository, RecurringInterestRepository,
};
use crate::modules::loans::services::interest_calculator::{InterestCalculator, InterestEarnings};
use crate::modules::loans::services::loan_summary::{
    LoanSummaryBuilder, LoanWithPayments, LoansSummary,
};
use crate::modules::transactions::repositories::TransactionRepository;

const DEFAULT_DUE_DAYS: i64 = 7;

/// Request to create a loan out of an existing ledger transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLoanFromTransactionRequest {
    pub transaction_id: String,
    pub borrower_name: Option<String>,
    pub due_date: Option<NaiveDateTime>,
    pub interest_rate: Option<Decimal>,
    pub interest_type: Option<InterestType>,
    pub period_rule: Option<PeriodRule>,
    pub market_reference: Option<Decimal>,
    pub created_at: Option<NaiveDateTime>,
    pub notes: Option<String>,
}

/// One entry of a batch creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct LoanBatchItem {
    pub amount: Decimal,
    pub category_id: String,
    pub due_date: NaiveDateTime,
    pub interest_rate: Option<Decimal>,
    pub interest_type: Option<InterestType>,
    pub period_rule: Option<PeriodRule>,
    pub market_reference: Option<Decimal>,
    pub expected_profit: Option<Decimal>,
    #[serde(default)]
    pub is_recurring_interest: bool,
    pub recurring_interest_day: Option<i32>,
    pub created_at: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Request to create several loans for one borrower in a single unit.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLoanBatchRequest {
    pub borrower_name: String,
    pub transaction_id: Option<String>,
    pub items: Vec<LoanBatchItem>,
}

/// Partial update of a loan; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLoanRequest {
    pub borrower_name: Option<String>,
    pub amount: Option<Decimal>,
    pub category_id: Option<String>,
    pub due_date: Option<NaiveDateTime>,
    pub is_paid: Option<bool>,
    pub interest_rate: Option<Decimal>,
    pub interest_type: Option<InterestType>,
    pub period_rule: Option<PeriodRule>,
    pub market_reference: Option<Decimal>,
    pub expected_profit: Option<Decimal>,
    pub is_recurring_interest: Option<bool>,
    pub recurring_interest_day: Option<i32>,
    pub created_at: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// A loan with its relations and derived balances, as returned by the
/// listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoanOverview {
    #[serde(flatten)]
    pub loan: Loan,
    pub category: Option<Category>,
    pub payments: Vec<LoanPayment>,
    pub recurring_payments: Vec<RecurringInterestPayment>,
    pub total_paid: Decimal,
    pub remaining_balance: Decimal,
    pub recurring_interest_paid: Decimal,
    pub recurring_interest_pending: Decimal,
}

/// Interest earnings over the whole book, including the recurring
/// installments that never touch the principal.
#[derive(Debug, Clone, Serialize)]
pub struct InterestEarningsReport {
    #[serde(flatten)]
    pub earnings: InterestEarnings,
    pub recurring_interest_paid: Decimal,
    pub recurring_interest_pending: Decimal,
    pub total_recurring_interest: Decimal,
}

/// Service for loan lifecycle business logic
pub struct LoanService {
    loans: LoanRepository,
    payments: LoanPaymentRepository,
    recurring: RecurringInterestRepository,
    categories: CategoryRepository,
    transactions: TransactionRepository,
}

impl LoanService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            loans: LoanRepository::new(pool.clone()),
            payments: LoanPaymentRepository::new(pool.clone()),
            recurring: RecurringInterestRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool),
        }
    }

    /// Create a loan. The referenced category must exist and be either a
    /// shared default or owned by the caller.
    pub async fn create_loan(&self, user_id: &str, draft: LoanDraft) -> Result<Loan> {
        self.ensure_category_available(&draft.category_id, user_id)
            .await?;

        let loan = Loan::from_draft(user_id.to_string(), draft, Utc::now().naive_utc())?;
        self.loans.insert(&loan).await?;

        info!(loan_id = loan.id.as_str(), user_id, "Loan created");
        Ok(loan)
    }

    /// Create a loan out of a ledger transaction the caller owns. The
    /// transaction must already be classified into a category.
    pub async fn create_from_transaction(
        &self,
        user_id: &str,
        req: CreateLoanFromTransactionRequest,
    ) -> Result<Loan> {
        let transaction = self
            .transactions
            .find_by_id(&req.transaction_id)
            .await?
            .ok_or_else(|| AppError::not_found("Transaction not found"))?;
        transaction.ensure_owned_by(user_id)?;

        let category_id = transaction.category_id.clone().ok_or_else(|| {
            AppError::validation("Transaction must be classified into a category")
        })?;

        self.categories
            .find_by_id(&category_id)
            .await?
            .ok_or_else(|| AppError::not_found("Category not found"))?;

        let now = Utc::now().naive_utc();
        let draft = LoanDraft {
            borrower_name: req
                .borrower_name
                .unwrap_or_else(|| transaction.description.clone()),
            amount: transaction.value.abs(),
            category_id,
            due_date: req
                .due_date
                .unwrap_or(now + Duration::days(DEFAULT_DUE_DAYS)),
            transaction_id: Some(req.transaction_id.clone()),
            description: Some(format!(
                "Loan created from transaction: {}",
                transaction.description
            )),
            notes: req.notes.or(transaction.notes),
            interest_rate: req.interest_rate,
            interest_type: req.interest_type,
            period_rule: req.period_rule,
            market_reference: req.market_reference,
            expected_profit: None,
            is_recurring_interest: false,
            recurring_interest_day: None,
            created_at: req.created_at,
        };

        let loan = Loan::from_draft(user_id.to_string(), draft, now)?;
        self.loans.insert(&loan).await?;

        info!(
            loan_id = loan.id.as_str(),
            transaction_id = req.transaction_id.as_str(),
            "Loan created from transaction"
        );
        Ok(loan)
    }

    /// Create several loans as one atomic unit. Validation is fail-fast:
    /// a bad transaction reference or category anywhere in the batch
    /// means nothing is written.
    pub async fn create_batch(
        &self,
        user_id: &str,
        req: CreateLoanBatchRequest,
    ) -> Result<Vec<Loan>> {
        if let Some(transaction_id) = &req.transaction_id {
            let transaction = self
                .transactions
                .find_by_id(transaction_id)
                .await?
                .ok_or_else(|| AppError::not_found("Transaction not found"))?;
            transaction.ensure_owned_by(user_id)?;
        }

        for item in &req.items {
            self.ensure_category_available(&item.category_id, user_id)
                .await?;
        }

        let now = Utc::now().naive_utc();
        let loans = Self::build_batch_loans(user_id, req, now)?;

        self.loans.insert_batch(&loans).await?;

        info!(user_id, count = loans.len(), "Loan batch created");
        Ok(loans)
    }

    /// Assemble the batch's loans, precomputing the expected profit of
    /// every interest-bearing item from its creation date to its due
    /// date. Pure: all validation against storage happens before this.
    fn build_batch_loans(
        user_id: &str,
        req: CreateLoanBatchRequest,
        now: NaiveDateTime,
    ) -> Result<Vec<Loan>> {
        let mut loans = Vec::with_capacity(req.items.len());

        for item in req.items {
            let expected_profit = match item.interest_rate {
                Some(rate) if rate > Decimal::ZERO => {
                    let created = item.created_at.unwrap_or(now);
                    let months = InterestCalculator::months_duration(created, item.due_date);
                    Some(round_cents(InterestCalculator::expected_profit(
                        item.amount,
                        rate,
                        item.interest_type.unwrap_or(InterestType::Simple),
                        item.period_rule.unwrap_or(PeriodRule::Monthly),
                        months,
                    )))
                }
                _ => None,
            };

            let draft = LoanDraft {
                borrower_name: req.borrower_name.clone(),
                amount: item.amount,
                category_id: item.category_id,
                due_date: item.due_date,
                transaction_id: req.transaction_id.clone(),
                description: item.description,
                notes: item.notes,
                interest_rate: item.interest_rate,
                interest_type: item.interest_type,
                period_rule: item.period_rule,
                market_reference: item.market_reference,
                expected_profit,
                is_recurring_interest: item.is_recurring_interest,
                recurring_interest_day: item.recurring_interest_day,
                created_at: item.created_at,
            };

            loans.push(Loan::from_draft(user_id.to_string(), draft, now)?);
        }

        Ok(loans)
    }

    /// List the owner's loans with relations and derived balances.
    pub async fn get_loans(
        &self,
        user_id: &str,
        is_paid: Option<bool>,
    ) -> Result<Vec<LoanOverview>> {
        let loans = self.loans.find_by_owner(user_id, is_paid).await?;
        let mut payments_by_loan = Self::group_by_loan(self.payments.find_by_owner(user_id).await?);
        let mut recurring_by_loan =
            Self::group_recurring_by_loan(self.recurring.find_by_owner(user_id).await?);
        let categories = self.categories_by_id(&loans).await?;

        Ok(loans
            .into_iter()
            .map(|loan| {
                let payments = payments_by_loan.remove(&loan.id).unwrap_or_default();
                let recurring_payments = recurring_by_loan.remove(&loan.id).unwrap_or_default();

                let total_paid: Decimal = payments.iter().map(|p| p.amount).sum();
                let remaining_balance = loan.amount - total_paid;
                let recurring_interest_paid = recurring_payments
                    .iter()
                    .filter(|r| r.is_paid)
                    .map(|r| r.amount)
                    .sum();
                let recurring_interest_pending = recurring_payments
                    .iter()
                    .filter(|r| !r.is_paid)
                    .map(|r| r.amount)
                    .sum();

                let category = categories.get(&loan.category_id).cloned();
                LoanOverview {
                    loan,
                    category,
                    payments,
                    recurring_payments,
                    total_paid,
                    remaining_balance,
                    recurring_interest_paid,
                    recurring_interest_pending,
                }
            })
            .collect())
    }

    /// Fetch one loan, merging "owned by someone else" into "not found".
    pub async fn get_loan(&self, id: &str, user_id: &str) -> Result<Loan> {
        let loan = self
            .loans
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Loan not found"))?;
        loan.ensure_owned_by(user_id)?;
        Ok(loan)
    }

    /// Partial update. A changed category is revalidated against the
    /// caller before anything is written.
    pub async fn update_loan(
        &self,
        id: &str,
        user_id: &str,
        req: UpdateLoanRequest,
    ) -> Result<Loan> {
        let mut loan = self.get_loan(id, user_id).await?;

        if let Some(category_id) = &req.category_id {
            self.ensure_category_available(category_id, user_id).await?;
        }

        if let Some(amount) = req.amount {
            if amount <= Decimal::ZERO {
                return Err(AppError::validation("Loan amount must be positive"));
            }
            loan.amount = amount;
        }
        if let Some(borrower_name) = req.borrower_name {
            loan.borrower_name = borrower_name;
        }
        if let Some(category_id) = req.category_id {
            loan.category_id = category_id;
        }
        if let Some(due_date) = req.due_date {
            loan.due_date = due_date;
        }
        if let Some(is_paid) = req.is_paid {
            loan.is_paid = is_paid;
        }
        if let Some(interest_rate) = req.interest_rate {
            if interest_rate < Decimal::ZERO {
                return Err(AppError::validation("Interest rate cannot be negative"));
            }
            loan.interest_rate = Some(interest_rate);
        }
        if let Some(interest_type) = req.interest_type {
            loan.interest_type = Some(interest_type);
        }
        if let Some(period_rule) = req.period_rule {
            loan.period_rule = Some(period_rule);
        }
        if let Some(market_reference) = req.market_reference {
            loan.market_reference = Some(market_reference);
        }
        if let Some(expected_profit) = req.expected_profit {
            loan.expected_profit = Some(expected_profit);
        }
        if let Some(is_recurring_interest) = req.is_recurring_interest {
            loan.is_recurring_interest = is_recurring_interest;
        }
        if let Some(recurring_interest_day) = req.recurring_interest_day {
            loan.recurring_interest_day = Some(recurring_interest_day);
        }
        if let Some(created_at) = req.created_at {
            loan.created_at = created_at;
        }
        if let Some(description) = req.description {
            loan.description = Some(description);
        }
        if let Some(notes) = req.notes {
            loan.notes = Some(notes);
        }

        self.loans.update(&loan).await?;
        Ok(loan)
    }

    /// Flag a loan as settled, stamping the settlement date.
    pub async fn mark_as_paid(&self, id: &str, user_id: &str) -> Result<Loan> {
        let mut loan = self.get_loan(id, user_id).await?;
        loan.mark_as_paid(Utc::now().naive_utc());
        self.loans.update(&loan).await?;

        info!(loan_id = id, "Loan marked as paid");
        Ok(loan)
    }

    /// Return a settled loan to the unpaid state.
    pub async fn reverse_payment(&self, id: &str, user_id: &str) -> Result<Loan> {
        let mut loan = self.get_loan(id, user_id).await?;
        loan.reverse_payment();
        self.loans.update(&loan).await?;

        info!(loan_id = id, "Loan payment reversed");
        Ok(loan)
    }

    /// Hard delete after the ownership lookup.
    pub async fn delete_loan(&self, id: &str, user_id: &str) -> Result<()> {
        self.get_loan(id, user_id).await?;
        self.loans.delete(id).await?;

        info!(loan_id = id, "Loan deleted");
        Ok(())
    }

    /// Aggregate picture of the owner's book: totals, overdue/upcoming
    /// slices, unlinked loans, category grouping, interest earnings.
    pub async fn get_loans_summary(&self, user_id: &str) -> Result<LoansSummary> {
        let loans = self.loans.find_by_owner(user_id, None).await?;
        let mut payments_by_loan = Self::group_by_loan(self.payments.find_by_owner(user_id).await?);
        let categories = self.categories_by_id(&loans).await?;

        let entries: Vec<LoanWithPayments> = loans
            .into_iter()
            .map(|loan| {
                let payments = payments_by_loan.remove(&loan.id).unwrap_or_default();
                let category_name = categories.get(&loan.category_id).map(|c| c.name.clone());
                LoanWithPayments {
                    loan,
                    payments,
                    category_name,
                }
            })
            .collect();

        Ok(LoanSummaryBuilder::build(&entries, Utc::now().naive_utc()))
    }

    /// Earnings across the book, with recurring interest folded in.
    pub async fn get_interest_earnings(&self, user_id: &str) -> Result<InterestEarningsReport> {
        let loans = self.loans.find_by_owner(user_id, None).await?;
        let recurring = self.recurring.find_by_owner(user_id).await?;

        let earnings = InterestCalculator::total_interest_earned(&loans);
        let recurring_interest_paid: Decimal = recurring
            .iter()
            .filter(|r| r.is_paid)
            .map(|r| r.amount)
            .sum();
        let recurring_interest_pending: Decimal = recurring
            .iter()
            .filter(|r| !r.is_paid)
            .map(|r| r.amount)
            .sum();

        Ok(InterestEarningsReport {
            earnings,
            recurring_interest_paid,
            recurring_interest_pending,
            total_recurring_interest: recurring_interest_paid + recurring_interest_pending,
        })
    }

    async fn ensure_category_available(&self, category_id: &str, user_id: &str) -> Result<()> {
        let category = self
            .categories
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| AppError::not_found("Category not found"))?;

        if !category.is_available_to(user_id) {
            return Err(AppError::validation("Category not available"));
        }

        Ok(())
    }

    async fn categories_by_id(&self, loans: &[Loan]) -> Result<HashMap<String, Category>> {
        let mut ids: Vec<String> = loans.iter().map(|l| l.category_id.clone()).collect();
        ids.sort();
        ids.dedup();

        Ok(self
            .categories
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect())
    }

    fn group_by_loan(payments: Vec<LoanPayment>) -> HashMap<String, Vec<LoanPayment>> {
        let mut grouped: HashMap<String, Vec<LoanPayment>> = HashMap::new();
        for payment in payments {
            grouped.entry(payment.loan_id.clone()).or_default().push(payment);
        }
        grouped
    }

    fn group_recurring_by_loan(
        payments: Vec<RecurringInterestPayment>,
    ) -> HashMap<String, Vec<RecurringInterestPayment>> {
        let mut grouped: HashMap<String, Vec<RecurringInterestPayment>> = HashMap::new();
        for payment in payments {
            grouped.entry(payment.loan_id.clone()).or_default().push(payment);
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn item(amount: Decimal, rate: Option<Decimal>) -> LoanBatchItem {
        LoanBatchItem {
            amount,
            category_id: "cat-1".to_string(),
            due_date: dt(2026, 4, 1),
            interest_rate: rate,
            interest_type: None,
            period_rule: None,
            market_reference: None,
            expected_profit: None,
            is_recurring_interest: false,
            recurring_interest_day: None,
            created_at: Some(dt(2026, 1, 1)),
            description: None,
            notes: None,
        }
    }

    #[test]
    fn test_batch_precomputes_expected_profit() {
        let req = CreateLoanBatchRequest {
            borrower_name: "Alice".to_string(),
            transaction_id: None,
            items: vec![item(dec!(1000), Some(dec!(2))), item(dec!(500), None)],
        };

        let loans = LoanService::build_batch_loans("user-1", req, dt(2026, 1, 1)).unwrap();

        // 3 months at 2% simple → 60
        assert_eq!(loans[0].expected_profit, Some(dec!(60)));
        // no rate, no projection
        assert_eq!(loans[1].expected_profit, None);

        assert!(loans.iter().all(|l| l.user_id == "user-1"));
        assert!(loans.iter().all(|l| l.borrower_name == "Alice"));
    }

    #[test]
    fn test_batch_rejects_bad_item_before_any_loan_is_built() {
        let req = CreateLoanBatchRequest {
            borrower_name: "Alice".to_string(),
            transaction_id: None,
            items: vec![item(dec!(1000), None), item(dec!(0), None)],
        };

        // one malformed item poisons the whole batch
        assert!(LoanService::build_batch_loans("user-1", req, dt(2026, 1, 1)).is_err());
    }
}
