// Unit tests for recurring interest scheduling: reference month
// normalization, idempotent month planning, and the monthly charge.

use chrono::NaiveDate;
use loanbook::loans::models::{reference_month_of, RecurringInterestPayment};
use loanbook::loans::services::RecurringInterestService;
use rust_decimal_macros::dec;
use std::collections::HashSet;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn reference_months_normalize_to_first_of_month() {
    assert_eq!(reference_month_of(date(2026, 7, 23)), date(2026, 7, 1));
    assert_eq!(reference_month_of(date(2026, 7, 1)), date(2026, 7, 1));
}

#[test]
fn planner_generates_inclusive_month_range() {
    // months_ahead = 2 covers the current month plus two more
    let months = RecurringInterestService::missing_reference_months(
        date(2026, 2, 10),
        2,
        &HashSet::new(),
    );

    assert_eq!(
        months,
        vec![date(2026, 2, 1), date(2026, 3, 1), date(2026, 4, 1)]
    );
}

#[test]
fn planner_is_idempotent() {
    // generating twice with months_ahead = 2: the first pass yields three
    // months, the second yields none
    let first = RecurringInterestService::missing_reference_months(
        date(2026, 2, 10),
        2,
        &HashSet::new(),
    );
    assert_eq!(first.len(), 3);

    let existing: HashSet<NaiveDate> = first.into_iter().collect();
    let second =
        RecurringInterestService::missing_reference_months(date(2026, 2, 10), 2, &existing);

    assert!(second.is_empty());
}

#[test]
fn planner_fills_only_the_gaps() {
    let existing: HashSet<NaiveDate> = [date(2026, 2, 1), date(2026, 4, 1)].into();

    let months =
        RecurringInterestService::missing_reference_months(date(2026, 2, 10), 3, &existing);

    assert_eq!(months, vec![date(2026, 3, 1), date(2026, 5, 1)]);
}

#[test]
fn pending_installment_starts_unpaid_and_settles_in_place() {
    let now = date(2026, 2, 10).and_hms_opt(9, 0, 0).unwrap();
    let mut installment = RecurringInterestPayment::new_pending(
        "loan-1".to_string(),
        date(2026, 2, 17),
        dec!(20),
        now,
    );

    // created against the normalized month, unpaid
    assert_eq!(installment.reference_month, date(2026, 2, 1));
    assert!(!installment.is_paid);

    installment.settle(None, None, None, now);
    assert!(installment.is_paid);
    assert_eq!(installment.amount, dec!(20));

    installment.reverse();
    assert!(!installment.is_paid);
    assert!(installment.paid_date.is_none());
    // the charge survives the reversal
    assert_eq!(installment.amount, dec!(20));
}
