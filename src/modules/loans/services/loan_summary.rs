use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::modules::loans::models::{Loan, LoanPayment};
use crate::modules::loans::services::interest_calculator::{InterestCalculator, InterestEarnings};

/// Label used when an unpaid loan has no resolvable category.
pub const UNCATEGORIZED: &str = "Sem categoria";

const UPCOMING_WINDOW_DAYS: i64 = 7;

/// A loan joined with its recorded payments, as fetched for aggregation.
#[derive(Debug, Clone)]
pub struct LoanWithPayments {
    pub loan: Loan,
    pub payments: Vec<LoanPayment>,
    pub category_name: Option<String>,
}

impl LoanWithPayments {
    /// Sum of all recorded payments. May exceed the principal.
    pub fn total_paid(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Principal minus payments, unclamped: overpayment shows as negative.
    pub fn remaining_balance(&self) -> Decimal {
        self.loan.amount - self.total_paid()
    }

    /// Outstanding debt, floored at zero for aggregate totals.
    pub fn outstanding(&self) -> Decimal {
        self.remaining_balance().max(Decimal::ZERO)
    }
}

/// A loan with its payment-adjusted balances, as listed in the overdue
/// and upcoming slices of the summary.
#[derive(Debug, Clone, Serialize)]
pub struct LoanBalance {
    #[serde(flatten)]
    pub loan: Loan,
    pub total_paid: Decimal,
    pub remaining_balance: Decimal,
}

/// Aggregate financial picture of one owner's loan book.
#[derive(Debug, Clone, Serialize)]
pub struct LoansSummary {
    /// Outstanding balance over unpaid loans
    pub total_loaned: Decimal,
    /// Recorded payments over loans flagged paid
    pub total_paid: Decimal,
    pub total_loans: usize,
    pub paid_loans: usize,
    pub overdue_loans: Vec<LoanBalance>,
    pub upcoming_payments: Vec<LoanBalance>,
    pub overdue_amount: Decimal,
    pub overdue_count: usize,
    pub upcoming_amount_7_days: Decimal,
    /// Shortfall across loans flagged paid whose payments don't cover them
    pub unlinked_amount: Decimal,
    pub unlinked_count: usize,
    /// Outstanding balance of unpaid loans grouped by category name
    pub by_category: BTreeMap<String, Decimal>,
    pub interest_earnings: InterestEarnings,
}

/// Builds the loan-book summary from rows already fetched for one owner.
/// Pure: all slices and totals derive from the input set and `now`.
pub struct LoanSummaryBuilder;

impl LoanSummaryBuilder {
    pub fn build(loans: &[LoanWithPayments], now: NaiveDateTime) -> LoansSummary {
        let total_loaned = loans
            .iter()
            .filter(|entry| !entry.loan.is_paid)
            .map(|entry| entry.outstanding())
            .sum();

        let total_paid = loans
            .iter()
            .filter(|entry| entry.loan.is_paid)
            .map(|entry| entry.total_paid())
            .sum();

        // Loans flagged paid whose recorded payments fall short of the
        // principal: settled outside the ledger, or not linked yet.
        let unlinked: Vec<&LoanWithPayments> = loans
            .iter()
            .filter(|entry| entry.loan.is_paid && entry.total_paid() < entry.loan.amount)
            .collect();
        let unlinked_amount = unlinked.iter().map(|entry| entry.outstanding()).sum();
        let unlinked_count = unlinked.len();

        let window_end = now + Duration::days(UPCOMING_WINDOW_DAYS);

        let mut overdue_loans: Vec<&LoanWithPayments> = loans
            .iter()
            .filter(|entry| !entry.loan.is_paid && entry.loan.due_date < now)
            .collect();
        overdue_loans.sort_by_key(|entry| entry.loan.due_date);

        let mut upcoming_payments: Vec<&LoanWithPayments> = loans
            .iter()
            .filter(|entry| {
                !entry.loan.is_paid
                    && entry.loan.due_date >= now
                    && entry.loan.due_date <= window_end
            })
            .collect();
        upcoming_payments.sort_by_key(|entry| entry.loan.due_date);

        let overdue_amount = overdue_loans.iter().map(|entry| entry.outstanding()).sum();
        let overdue_count = overdue_loans.len();
        let upcoming_amount_7_days = upcoming_payments
            .iter()
            .map(|entry| entry.outstanding())
            .sum();

        let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
        for entry in loans.iter().filter(|entry| !entry.loan.is_paid) {
            let name = entry
                .category_name
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            *by_category.entry(name).or_insert(Decimal::ZERO) += entry.outstanding();
        }

        let all_loans: Vec<Loan> = loans.iter().map(|entry| entry.loan.clone()).collect();
        let interest_earnings = InterestCalculator::total_interest_earned(&all_loans);

        LoansSummary {
            total_loaned,
            total_paid,
            total_loans: loans.len(),
            paid_loans: loans.iter().filter(|entry| entry.loan.is_paid).count(),
            overdue_loans: overdue_loans.into_iter().map(Self::balance).collect(),
            upcoming_payments: upcoming_payments.into_iter().map(Self::balance).collect(),
            overdue_amount,
            overdue_count,
            upcoming_amount_7_days,
            unlinked_amount,
            unlinked_count,
            by_category,
            interest_earnings,
        }
    }

    fn balance(entry: &LoanWithPayments) -> LoanBalance {
        LoanBalance {
            loan: entry.loan.clone(),
            total_paid: entry.total_paid(),
            remaining_balance: entry.remaining_balance(),
        }
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
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn loan(id: &str, amount: Decimal, due: NaiveDateTime, is_paid: bool) -> Loan {
        Loan {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            borrower_name: "Alice".to_string(),
            amount,
            category_id: "cat-1".to_string(),
            transaction_id: None,
            due_date: due,
            description: None,
            notes: None,
            interest_rate: None,
            interest_type: None,
            period_rule: None,
            market_reference: None,
            expected_profit: None,
            is_recurring_interest: false,
            recurring_interest_day: None,
            is_paid,
            paid_date: None,
            created_at: dt(2026, 1, 1),
        }
    }

    fn payment(loan_id: &str, amount: Decimal) -> LoanPayment {
        LoanPayment::new(loan_id.to_string(), None, amount, None, dt(2026, 1, 10))
    }

    fn entry(
        loan: Loan,
        payments: Vec<LoanPayment>,
        category_name: Option<&str>,
    ) -> LoanWithPayments {
        LoanWithPayments {
            loan,
            payments,
            category_name: category_name.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_outstanding_clamps_overpayment() {
        let e = entry(
            loan("l1", dec!(100), dt(2026, 2, 1), false),
            vec![payment("l1", dec!(150))],
            None,
        );
        assert_eq!(e.remaining_balance(), dec!(-50));
        assert_eq!(e.outstanding(), dec!(0));
    }

    #[test]
    fn test_totals_split_by_paid_flag() {
        let now = dt(2026, 1, 15);
        let entries = vec![
            entry(
                loan("l1", dec!(500), dt(2026, 2, 1), false),
                vec![payment("l1", dec!(200))],
                None,
            ),
            entry(
                loan("l2", dec!(300), dt(2026, 1, 1), true),
                vec![payment("l2", dec!(300))],
                None,
            ),
        ];

        let summary = LoanSummaryBuilder::build(&entries, now);

        assert_eq!(summary.total_loaned, dec!(300)); // 500 − 200
        assert_eq!(summary.total_paid, dec!(300));
        assert_eq!(summary.total_loans, 2);
        assert_eq!(summary.paid_loans, 1);
    }

    #[test]
    fn test_unlinked_detection() {
        let now = dt(2026, 1, 15);
        // flagged paid with no payment rows at all
        let entries = vec![entry(loan("l1", dec!(250), dt(2026, 1, 1), true), vec![], None)];

        let summary = LoanSummaryBuilder::build(&entries, now);

        assert_eq!(summary.unlinked_count, 1);
        assert_eq!(summary.unlinked_amount, dec!(250));
    }

    #[test]
    fn test_overdue_and_upcoming_slices() {
        let now = dt(2026, 1, 15);
        let entries = vec![
            entry(loan("past", dec!(100), dt(2026, 1, 10), false), vec![], None),
            entry(loan("soon", dec!(200), dt(2026, 1, 20), false), vec![], None),
            entry(loan("later", dec!(400), dt(2026, 3, 1), false), vec![], None),
            entry(loan("done", dec!(800), dt(2026, 1, 10), true), vec![], None),
        ];

        let summary = LoanSummaryBuilder::build(&entries, now);

        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.overdue_loans[0].loan.id, "past");
        assert_eq!(summary.overdue_amount, dec!(100));

        assert_eq!(summary.upcoming_payments.len(), 1);
        assert_eq!(summary.upcoming_payments[0].loan.id, "soon");
        assert_eq!(summary.upcoming_amount_7_days, dec!(200));
    }

    #[test]
    fn test_by_category_grouping_with_fallback() {
        let now = dt(2026, 1, 15);
        let entries = vec![
            entry(
                loan("l1", dec!(100), dt(2026, 2, 1), false),
                vec![],
                Some("Família"),
            ),
            entry(
                loan("l2", dec!(50), dt(2026, 2, 1), false),
                vec![],
                Some("Família"),
            ),
            entry(loan("l3", dec!(70), dt(2026, 2, 1), false), vec![], None),
            entry(
                loan("l4", dec!(999), dt(2026, 2, 1), true),
                vec![],
                Some("Família"),
            ),
        ];

        let summary = LoanSummaryBuilder::build(&entries, now);

        assert_eq!(summary.by_category.get("Família"), Some(&dec!(150)));
        assert_eq!(summary.by_category.get(UNCATEGORIZED), Some(&dec!(70)));
        // paid loans never contribute to the category grouping
        assert_eq!(summary.by_category.len(), 2);
    }
}
