// Recurring interest installments: month-by-month interest-only charges
// for loans that accrue without amortizing principal.
//
// Generation is idempotent over (loan, reference month): months that
// already have a row are never duplicated or overwritten.

use chrono::{Months, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::core::money::round_cents;
use crate::core::{AppError, Result};
use crate::modules::categories::{Category, CategoryRepository};
use crate::modules::loans::models::{
    reference_month_of, Loan, PeriodRule, RecurringInterestPayment,
};
use crate::modules::loans::repositories::{LoanRepository, RecurringInterestRepository};
use crate::modules::loans::services::interest_calculator::InterestCalculator;

/// Request to settle one month's recurring interest charge.
#[derive(Debug, Clone, Deserialize)]
pub struct PayRecurringInterestRequest {
    pub loan_id: String,
    pub reference_month: NaiveDate,
    pub amount: Option<Decimal>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

/// Request to generate pending installments ahead of time.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRecurringInterestRequest {
    pub loan_id: String,
    #[serde(default = "default_months_ahead")]
    pub months_ahead: u32,
}

fn default_months_ahead() -> u32 {
    1
}

/// An active loan with its unpaid installments, for the pending view.
#[derive(Debug, Clone, Serialize)]
pub struct PendingRecurringInterest {
    #[serde(flatten)]
    pub loan: Loan,
    pub category: Option<Category>,
    pub recurring_payments: Vec<RecurringInterestPayment>,
}

/// One calendar month's bucket in the recurring interest summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthlyRecurringInterest {
    pub paid: Decimal,
    pub pending: Decimal,
    pub details: Vec<RecurringInterestDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecurringInterestDetail {
    pub loan_id: String,
    pub borrower_name: String,
    pub amount: Decimal,
    pub is_paid: bool,
    pub paid_date: Option<NaiveDateTime>,
}

/// Service for recurring interest installment business logic
pub struct RecurringInterestService {
    loans: LoanRepository,
    recurring: RecurringInterestRepository,
    categories: CategoryRepository,
}

impl RecurringInterestService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            loans: LoanRepository::new(pool.clone()),
            recurring: RecurringInterestRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool),
        }
    }

    /// Reference months from the current one through `months_ahead` that
    /// have no installment row yet, in calendar order. Pure; feeds the
    /// generator and keeps it idempotent.
    pub fn missing_reference_months(
        today: NaiveDate,
        months_ahead: u32,
        existing: &HashSet<NaiveDate>,
    ) -> Vec<NaiveDate> {
        let base = reference_month_of(today);

        (0..=months_ahead)
            .filter_map(|offset| base.checked_add_months(Months::new(offset)))
            .filter(|month| !existing.contains(month))
            .collect()
    }

    /// Generate pending installments for a loan, current month through
    /// `months_ahead`. Returns only the newly created rows; re-invoking
    /// creates nothing the second time.
    pub async fn generate_payments(
        &self,
        loan_id: &str,
        user_id: &str,
        months_ahead: u32,
    ) -> Result<Vec<RecurringInterestPayment>> {
        let loan = self.get_owned_loan(loan_id, user_id).await?;
        self.generate_for_loan(&loan, months_ahead).await
    }

    async fn generate_for_loan(
        &self,
        loan: &Loan,
        months_ahead: u32,
    ) -> Result<Vec<RecurringInterestPayment>> {
        let monthly_charge = Self::monthly_charge(loan)?;

        let existing: HashSet<NaiveDate> = self
            .recurring
            .find_months_by_loan(&loan.id)
            .await?
            .into_iter()
            .collect();

        let now = Utc::now().naive_utc();
        let months = Self::missing_reference_months(now.date(), months_ahead, &existing);

        let mut created = Vec::with_capacity(months.len());
        for month in months {
            let payment = RecurringInterestPayment::new_pending(
                loan.id.clone(),
                month,
                round_cents(monthly_charge),
                now,
            );
            self.recurring.insert(&payment).await?;
            created.push(payment);
        }

        if !created.is_empty() {
            info!(
                loan_id = loan.id.as_str(),
                created = created.len(),
                "Recurring interest installments generated"
            );
        }

        Ok(created)
    }

    /// Settle one month's charge. Missing months are created directly in
    /// the paid state with a defaulted amount; existing rows are updated
    /// in place.
    pub async fn pay(
        &self,
        user_id: &str,
        req: PayRecurringInterestRequest,
    ) -> Result<RecurringInterestPayment> {
        let loan = self.get_owned_loan(&req.loan_id, user_id).await?;

        let reference_month = reference_month_of(req.reference_month);
        let now = Utc::now().naive_utc();

        let payment = match self
            .recurring
            .find_by_loan_and_month(&req.loan_id, reference_month)
            .await?
        {
            None => {
                let amount = match req.amount {
                    Some(amount) => amount,
                    None => round_cents(Self::monthly_charge(&loan)?),
                };
                let payment = RecurringInterestPayment::new_paid(
                    req.loan_id.clone(),
                    reference_month,
                    amount,
                    req.transaction_id,
                    req.notes,
                    now,
                );
                self.recurring.insert(&payment).await?;
                payment
            }
            Some(mut payment) => {
                payment.settle(req.amount, req.transaction_id, req.notes, now);
                self.recurring.update(&payment).await?;
                payment
            }
        };

        info!(
            loan_id = req.loan_id.as_str(),
            reference_month = %reference_month,
            "Recurring interest paid"
        );
        Ok(payment)
    }

    /// Reverse a settled installment. The parent loan's ownership gates
    /// the operation; the amount is retained.
    pub async fn reverse(
        &self,
        payment_id: &str,
        user_id: &str,
    ) -> Result<RecurringInterestPayment> {
        let mut payment = self
            .recurring
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recurring interest payment not found"))?;

        let loan = self
            .loans
            .find_by_id(&payment.loan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recurring interest payment not found"))?;
        if loan.user_id != user_id {
            return Err(AppError::not_found("Recurring interest payment not found"));
        }

        payment.reverse();
        self.recurring.update(&payment).await?;

        info!(payment_id, "Recurring interest payment reversed");
        Ok(payment)
    }

    /// Active recurring-interest loans with their unpaid installments.
    /// The current month is generated first when missing, so every
    /// active loan shows at least one pending charge.
    pub async fn get_pending(&self, user_id: &str) -> Result<Vec<PendingRecurringInterest>> {
        let loans = self.loans.find_recurring_active(user_id).await?;

        for loan in &loans {
            self.generate_for_loan(loan, 0).await?;
        }

        let loans = self.loans.find_recurring_active(user_id).await?;
        let mut unpaid_by_loan: BTreeMap<String, Vec<RecurringInterestPayment>> = BTreeMap::new();
        for payment in self.recurring.find_unpaid_by_owner(user_id).await? {
            unpaid_by_loan
                .entry(payment.loan_id.clone())
                .or_default()
                .push(payment);
        }

        let mut category_ids: Vec<String> = loans.iter().map(|l| l.category_id.clone()).collect();
        category_ids.sort();
        category_ids.dedup();
        let categories: BTreeMap<String, Category> = self
            .categories
            .find_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        Ok(loans
            .into_iter()
            .map(|loan| {
                let recurring_payments = unpaid_by_loan.remove(&loan.id).unwrap_or_default();
                let category = categories.get(&loan.category_id).cloned();
                PendingRecurringInterest {
                    loan,
                    category,
                    recurring_payments,
                }
            })
            .collect())
    }

    /// Month-by-month recurring interest, `months_back` months into the
    /// past through the current month, keyed "YYYY-MM".
    pub async fn get_summary(
        &self,
        user_id: &str,
        months_back: u32,
    ) -> Result<BTreeMap<String, MonthlyRecurringInterest>> {
        let today = Utc::now().naive_utc().date();
        let start = reference_month_of(today)
            .checked_sub_months(Months::new(months_back.saturating_sub(1)))
            .ok_or_else(|| AppError::validation("Invalid summary window"))?;

        let rows = self.recurring.find_by_owner_since(user_id, start).await?;

        let mut by_month: BTreeMap<String, MonthlyRecurringInterest> = BTreeMap::new();
        for row in rows {
            let bucket = by_month.entry(row.payment.month_key()).or_default();

            if row.payment.is_paid {
                bucket.paid += row.payment.amount;
            } else {
                bucket.pending += row.payment.amount;
            }

            bucket.details.push(RecurringInterestDetail {
                loan_id: row.payment.loan_id.clone(),
                borrower_name: row.borrower_name,
                amount: row.payment.amount,
                is_paid: row.payment.is_paid,
                paid_date: row.payment.paid_date,
            });
        }

        Ok(by_month)
    }

    /// Per-month charge for a loan, requiring recurring interest to be
    /// configured.
    fn monthly_charge(loan: &Loan) -> Result<Decimal> {
        let rate = match (loan.is_recurring_interest, loan.interest_rate) {
            (true, Some(rate)) => rate,
            _ => {
                return Err(AppError::validation(
                    "Loan has no recurring interest configured",
                ))
            }
        };

        Ok(InterestCalculator::monthly_interest(
            loan.amount,
            rate,
            loan.period_rule.unwrap_or(PeriodRule::Monthly),
        ))
    }

    async fn get_owned_loan(&self, loan_id: &str, user_id: &str) -> Result<Loan> {
        let loan = self
            .loans
            .find_by_id(loan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Loan not found"))?;
        loan.ensure_owned_by(user_id)?;
        Ok(loan)
    }
}
