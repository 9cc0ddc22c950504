// Unit tests for balance reconciliation and the book summary: payment
// sums against principals, unlinked detection, and the aggregate totals.

use chrono::{NaiveDate, NaiveDateTime};
use loanbook::loans::models::{Loan, LoanPayment};
use loanbook::loans::services::{LoanSummaryBuilder, LoanWithPayments};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
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
    LoanPayment::new(loan_id.to_string(), None, amount, None, dt(2026, 1, 5))
}

fn entry(loan: Loan, payments: Vec<LoanPayment>) -> LoanWithPayments {
    LoanWithPayments {
        loan,
        payments,
        category_name: None,
    }
}

#[test]
fn balance_reconciliation_end_to_end() {
    // loan of 500 with payments of 200 and 150
    let entry = entry(
        loan("l1", dec!(500), dt(2026, 3, 1), false),
        vec![payment("l1", dec!(200)), payment("l1", dec!(150))],
    );

    assert_eq!(entry.total_paid(), dec!(350));
    assert_eq!(entry.remaining_balance(), dec!(150));
}

#[test]
fn summary_unlinked_detection() {
    // flagged paid, zero payment rows: the whole principal is unlinked
    let now = dt(2026, 1, 15);
    let entries = vec![entry(loan("l1", dec!(500), dt(2026, 1, 1), true), vec![])];

    let summary = LoanSummaryBuilder::build(&entries, now);

    assert_eq!(summary.unlinked_count, 1);
    assert_eq!(summary.unlinked_amount, dec!(500));
}

#[test]
fn summary_partial_shortfall_counts_as_unlinked() {
    let now = dt(2026, 1, 15);
    let entries = vec![entry(
        loan("l1", dec!(500), dt(2026, 1, 1), true),
        vec![payment("l1", dec!(300))],
    )];

    let summary = LoanSummaryBuilder::build(&entries, now);

    assert_eq!(summary.unlinked_count, 1);
    assert_eq!(summary.unlinked_amount, dec!(200));
    // payments on paid loans still count toward the paid total
    assert_eq!(summary.total_paid, dec!(300));
}

#[test]
fn summary_fully_covered_paid_loan_is_not_unlinked() {
    let now = dt(2026, 1, 15);
    let entries = vec![entry(
        loan("l1", dec!(500), dt(2026, 1, 1), true),
        vec![payment("l1", dec!(500))],
    )];

    let summary = LoanSummaryBuilder::build(&entries, now);

    assert_eq!(summary.unlinked_count, 0);
    assert_eq!(summary.unlinked_amount, dec!(0));
}

#[test]
fn summary_totals_over_mixed_book() {
    let now = dt(2026, 1, 15);
    let entries = vec![
        // unpaid, partially covered
        entry(
            loan("open", dec!(1000), dt(2026, 2, 1), false),
            vec![payment("open", dec!(400))],
        ),
        // paid and fully covered
        entry(
            loan("done", dec!(300), dt(2026, 1, 1), true),
            vec![payment("done", dec!(300))],
        ),
        // overdue, untouched
        entry(loan("late", dec!(250), dt(2026, 1, 10), false), vec![]),
    ];

    let summary = LoanSummaryBuilder::build(&entries, now);

    assert_eq!(summary.total_loans, 3);
    assert_eq!(summary.paid_loans, 1);
    assert_eq!(summary.total_loaned, dec!(850)); // 600 + 250
    assert_eq!(summary.total_paid, dec!(300));
    assert_eq!(summary.overdue_count, 1);
    assert_eq!(summary.overdue_amount, dec!(250));
    assert_eq!(summary.upcoming_payments.len(), 0);
}

#[test]
fn summary_upcoming_window_is_seven_days() {
    let now = dt(2026, 1, 15);
    let entries = vec![
        entry(loan("in-window", dec!(100), dt(2026, 1, 20), false), vec![]),
        entry(loan("at-edge", dec!(200), dt(2026, 1, 22), false), vec![]),
        entry(loan("beyond", dec!(400), dt(2026, 1, 23), false), vec![]),
    ];

    let summary = LoanSummaryBuilder::build(&entries, now);

    assert_eq!(summary.upcoming_payments.len(), 2);
    assert_eq!(summary.upcoming_amount_7_days, dec!(300));
}
