// Unit tests for the interest math: rate conversion, the two interest
// conventions, duration fallback, and the cent-precision guarantee on
// every monetary output.

use chrono::{NaiveDate, NaiveDateTime};
use loanbook::core::money::is_cent_exact;
use loanbook::loans::models::{InterestType, PeriodRule};
use loanbook::loans::services::{InterestCalculation, InterestCalculator};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn monthly_rate_conversion() {
    assert_eq!(
        InterestCalculator::convert_to_monthly_rate(dec!(12), PeriodRule::Annual),
        dec!(1)
    );
    assert_eq!(
        InterestCalculator::convert_to_monthly_rate(dec!(5), PeriodRule::Monthly),
        dec!(5)
    );
}

#[test]
fn simple_interest_formula() {
    // 1000 × 0.02 × 3
    assert_eq!(
        InterestCalculator::simple_interest(dec!(1000), dec!(2), dec!(3)),
        dec!(60)
    );
}

#[test]
fn compound_interest_formula() {
    // 1000 × 1.02³ − 1000 = 61.208
    let interest = InterestCalculator::compound_interest(dec!(1000), dec!(2), dec!(3));
    assert!((interest - dec!(61.208)).abs() < dec!(0.001));
}

#[test]
fn duration_is_zero_for_identical_dates() {
    assert_eq!(
        InterestCalculator::months_duration(dt(2026, 1, 1), dt(2026, 1, 1)),
        dec!(0)
    );
}

#[test]
fn duration_falls_back_to_day_fraction() {
    let months = InterestCalculator::months_duration(dt(2026, 1, 1), dt(2026, 1, 15));
    assert_eq!(months, dec!(14) / dec!(30));
    // ≈ 0.467
    assert!((months - dec!(0.4667)).abs() < dec!(0.001));
}

#[test]
fn duration_counts_whole_months_only() {
    assert_eq!(
        InterestCalculator::months_duration(dt(2026, 1, 10), dt(2026, 4, 10)),
        dec!(3)
    );
    // a partial month beyond a whole one does not count
    assert_eq!(
        InterestCalculator::months_duration(dt(2026, 1, 10), dt(2026, 4, 20)),
        dec!(3)
    );
}

#[test]
fn breakdown_rounds_and_annualizes() {
    let result = InterestCalculator::calculate_interest(&InterestCalculation {
        principal: dec!(2500),
        interest_rate: dec!(1.5),
        interest_type: InterestType::Simple,
        start_date: dt(2026, 1, 1),
        end_date: dt(2026, 6, 1),
    });

    // 2500 × 0.015 × 5
    assert_eq!(result.interest_amount, dec!(187.50));
    assert_eq!(result.total_amount, dec!(2687.50));
    assert_eq!(result.months_duration, dec!(5));
    assert_eq!(result.annualized_rate, dec!(18));
}

proptest! {
    // Every monetary output of a breakdown is an exact number of cents,
    // whatever principal, rate, convention, and date range produced it.
    #[test]
    fn breakdown_amounts_are_cent_exact(
        principal_cents in 1i64..100_000_000,
        rate_bp in 0i64..10_000,
        days in 0u64..1500,
        compound in any::<bool>(),
    ) {
        let start = dt(2024, 1, 1);
        let end = start + chrono::Duration::days(days as i64);

        let result = InterestCalculator::calculate_interest(&InterestCalculation {
            principal: Decimal::new(principal_cents, 2),
            interest_rate: Decimal::new(rate_bp, 2),
            interest_type: if compound { InterestType::Compound } else { InterestType::Simple },
            start_date: start,
            end_date: end,
        });

        prop_assert!(is_cent_exact(result.interest_amount));
        prop_assert!(is_cent_exact(result.total_amount));
    }
}
