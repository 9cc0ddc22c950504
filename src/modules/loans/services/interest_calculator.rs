use chrono::{Months, NaiveDateTime};
use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;

use crate::core::money::round_cents;
use crate::modules::loans::models::{InterestType, Loan, PeriodRule};

const PERCENT: Decimal = Decimal::ONE_HUNDRED;
const DAYS_PER_MONTH: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);
const SECONDS_PER_DAY: Decimal = Decimal::from_parts(86_400, 0, 0, false, 0);

/// Inputs for a single interest computation over a date range.
#[derive(Debug, Clone)]
pub struct InterestCalculation {
    pub principal: Decimal,
    /// Percent per month (used as stored, without period conversion)
    pub interest_rate: Decimal,
    pub interest_type: InterestType,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

/// Result of a single interest computation. Monetary fields are rounded
/// to cent precision at the point of return.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InterestBreakdown {
    pub principal: Decimal,
    pub interest_amount: Decimal,
    pub total_amount: Decimal,
    pub months_duration: Decimal,
    pub annualized_rate: Decimal,
}

/// Interest accrued across a loan portfolio, split by convention.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InterestEarnings {
    pub total_principal: Decimal,
    pub total_interest: Decimal,
    pub total_amount: Decimal,
    pub by_type: InterestByType,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InterestByType {
    pub simple: InterestTypeSlice,
    pub compound: InterestTypeSlice,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InterestTypeSlice {
    pub interest: Decimal,
    /// Percentage share of the portfolio's total interest
    pub amount: Decimal,
}

/// Pure interest math: no side effects, deterministic given inputs.
/// Degenerate inputs propagate as degenerate outputs rather than panics;
/// validation belongs to the callers.
pub struct InterestCalculator;

impl InterestCalculator {
    /// Count whole months between two dates by advancing `start` one
    /// calendar month at a time while the advanced date stays ≤ `end`.
    ///
    /// When no whole month fits, falls back to elapsed days / 30 as a
    /// fractional-month approximation. Always non-negative, even with
    /// `end < start`.
    pub fn months_duration(start: NaiveDateTime, end: NaiveDateTime) -> Decimal {
        let mut months: u32 = 0;
        let mut current = start;

        while current < end {
            match current.checked_add_months(Months::new(1)) {
                Some(next) if next <= end => {
                    months += 1;
                    current = next;
                }
                _ => break,
            }
        }

        if months == 0 {
            // ceil of the signed fractional day count, then abs, so a
            // reversed range lands on the same magnitude
            let seconds = Decimal::from((end - start).num_seconds());
            let days = (seconds / SECONDS_PER_DAY).ceil().abs();
            return days / DAYS_PER_MONTH;
        }

        Decimal::from(months)
    }

    /// Bring a period-relative rate to a monthly rate. Annual rates are
    /// divided by 12; no compounding adjustment is applied.
    pub fn convert_to_monthly_rate(rate: Decimal, period_rule: PeriodRule) -> Decimal {
        match period_rule {
            PeriodRule::Annual => rate / MONTHS_PER_YEAR,
            PeriodRule::Monthly => rate,
        }
    }

    /// interest = principal × rate × months
    pub fn simple_interest(principal: Decimal, monthly_rate: Decimal, months: Decimal) -> Decimal {
        principal * (monthly_rate / PERCENT) * months
    }

    /// interest = principal × (1 + rate)^months − principal
    ///
    /// The exponent may be fractional (day-based fallback durations).
    pub fn compound_interest(
        principal: Decimal,
        monthly_rate: Decimal,
        months: Decimal,
    ) -> Decimal {
        let growth = (Decimal::ONE + monthly_rate / PERCENT).powd(months);
        principal * growth - principal
    }

    /// Projected interest for a loan created now and due after `months`.
    pub fn expected_profit(
        principal: Decimal,
        rate: Decimal,
        interest_type: InterestType,
        period_rule: PeriodRule,
        months: Decimal,
    ) -> Decimal {
        let monthly_rate = Self::convert_to_monthly_rate(rate, period_rule);

        match interest_type {
            InterestType::Simple => Self::simple_interest(principal, monthly_rate, months),
            InterestType::Compound => Self::compound_interest(principal, monthly_rate, months),
        }
    }

    /// Full breakdown for one loan over a date range.
    ///
    /// The stored rate is applied as a monthly rate without conversion,
    /// and `annualized_rate` is always rate × 12, also for loans whose
    /// `period_rule` is annual.
    pub fn calculate_interest(calc: &InterestCalculation) -> InterestBreakdown {
        let months = Self::months_duration(calc.start_date, calc.end_date);

        let interest_amount = match calc.interest_type {
            InterestType::Simple => Self::simple_interest(calc.principal, calc.interest_rate, months),
            InterestType::Compound => {
                Self::compound_interest(calc.principal, calc.interest_rate, months)
            }
        };

        InterestBreakdown {
            principal: calc.principal,
            interest_amount: round_cents(interest_amount),
            total_amount: round_cents(calc.principal + interest_amount),
            months_duration: round_cents(months),
            annualized_rate: calc.interest_rate * MONTHS_PER_YEAR,
        }
    }

    /// Accrued interest across a portfolio. Each interest-bearing loan is
    /// measured from its creation to its settlement date when paid, or to
    /// its due date otherwise.
    pub fn total_interest_earned(loans: &[Loan]) -> InterestEarnings {
        let mut total_principal = Decimal::ZERO;
        let mut total_interest = Decimal::ZERO;
        let mut simple_interest = Decimal::ZERO;
        let mut compound_interest = Decimal::ZERO;

        for loan in loans {
            total_principal += loan.amount;

            let rate = match loan.interest_rate {
                Some(rate) if rate > Decimal::ZERO => rate,
                _ => continue,
            };

            let end_date = match (loan.is_paid, loan.paid_date) {
                (true, Some(paid_date)) => paid_date,
                _ => loan.due_date,
            };

            let interest_type = loan.interest_type.unwrap_or(InterestType::Simple);
            let result = Self::calculate_interest(&InterestCalculation {
                principal: loan.amount,
                interest_rate: rate,
                interest_type,
                start_date: loan.created_at,
                end_date,
            });

            total_interest += result.interest_amount;
            match interest_type {
                InterestType::Compound => compound_interest += result.interest_amount,
                InterestType::Simple => simple_interest += result.interest_amount,
            }
        }

        let share = |part: Decimal| {
            if total_interest.is_zero() {
                Decimal::ZERO
            } else {
                round_cents(part / total_interest * PERCENT)
            }
        };

        InterestEarnings {
            total_principal,
            total_interest: round_cents(total_interest),
            total_amount: round_cents(total_principal + total_interest),
            by_type: InterestByType {
                simple: InterestTypeSlice {
                    interest: round_cents(simple_interest),
                    amount: share(simple_interest),
                },
                compound: InterestTypeSlice {
                    interest: round_cents(compound_interest),
                    amount: share(compound_interest),
                },
            },
        }
    }

    /// Per-month charge for a loan with recurring interest, unrounded.
    pub fn monthly_interest(amount: Decimal, rate: Decimal, period_rule: PeriodRule) -> Decimal {
        let monthly_rate = Self::convert_to_monthly_rate(rate, period_rule);
        amount * (monthly_rate / PERCENT)
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

    #[test]
    fn test_whole_months() {
        assert_eq!(
            InterestCalculator::months_duration(dt(2026, 1, 1), dt(2026, 4, 1)),
            dec!(3)
        );
        assert_eq!(
            InterestCalculator::months_duration(dt(2026, 1, 15), dt(2026, 2, 15)),
            dec!(1)
        );
    }

    #[test]
    fn test_partial_month_falls_back_to_days() {
        // 14 days → 14/30 of a month
        let months = InterestCalculator::months_duration(dt(2026, 1, 1), dt(2026, 1, 15));
        assert_eq!(months, dec!(14) / dec!(30));
    }

    #[test]
    fn test_zero_and_reversed_ranges() {
        assert_eq!(
            InterestCalculator::months_duration(dt(2026, 1, 1), dt(2026, 1, 1)),
            dec!(0)
        );
        // reversed range never advances the loop but still lands on a
        // non-negative day fraction
        let months = InterestCalculator::months_duration(dt(2026, 1, 15), dt(2026, 1, 1));
        assert!(months >= dec!(0));
        assert_eq!(months, dec!(14) / dec!(30));
    }

    #[test]
    fn test_partial_beyond_whole_month_is_truncated() {
        // one whole month plus a week counts as exactly one month
        assert_eq!(
            InterestCalculator::months_duration(dt(2026, 1, 1), dt(2026, 2, 8)),
            dec!(1)
        );
    }

    #[test]
    fn test_rate_conversion() {
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
    fn test_simple_interest() {
        assert_eq!(
            InterestCalculator::simple_interest(dec!(1000), dec!(2), dec!(3)),
            dec!(60)
        );
    }

    #[test]
    fn test_compound_interest() {
        let interest = InterestCalculator::compound_interest(dec!(1000), dec!(2), dec!(3));
        // 1000 × 1.02³ − 1000 = 61.208
        assert!((interest - dec!(61.208)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_expected_profit_dispatch() {
        let simple = InterestCalculator::expected_profit(
            dec!(1000),
            dec!(24),
            InterestType::Simple,
            PeriodRule::Annual,
            dec!(3),
        );
        // 24% annual → 2% monthly → 1000 × 0.02 × 3
        assert_eq!(simple, dec!(60));

        let compound = InterestCalculator::expected_profit(
            dec!(1000),
            dec!(2),
            InterestType::Compound,
            PeriodRule::Monthly,
            dec!(3),
        );
        assert!((compound - dec!(61.208)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_calculate_interest_rounds_to_cents() {
        let result = InterestCalculator::calculate_interest(&InterestCalculation {
            principal: dec!(1000),
            interest_rate: dec!(2),
            interest_type: InterestType::Compound,
            start_date: dt(2026, 1, 1),
            end_date: dt(2026, 4, 1),
        });

        assert_eq!(result.interest_amount, dec!(61.21));
        assert_eq!(result.total_amount, dec!(1061.21));
        assert_eq!(result.months_duration, dec!(3));
        assert_eq!(result.annualized_rate, dec!(24));
    }

    fn interest_loan(
        amount: Decimal,
        rate: Option<Decimal>,
        interest_type: Option<InterestType>,
        is_paid: bool,
        paid: Option<NaiveDateTime>,
    ) -> Loan {
        Loan {
            id: "loan".to_string(),
            user_id: "user".to_string(),
            borrower_name: "Bob".to_string(),
            amount,
            category_id: "cat".to_string(),
            transaction_id: None,
            due_date: dt(2026, 4, 1),
            description: None,
            notes: None,
            interest_rate: rate,
            interest_type,
            period_rule: None,
            market_reference: None,
            expected_profit: None,
            is_recurring_interest: false,
            recurring_interest_day: None,
            is_paid,
            paid_date: paid,
            created_at: dt(2026, 1, 1),
        }
    }

    #[test]
    fn test_total_interest_earned_buckets_by_type() {
        let loans = vec![
            interest_loan(dec!(1000), Some(dec!(2)), Some(InterestType::Simple), false, None),
            interest_loan(dec!(1000), Some(dec!(2)), Some(InterestType::Compound), false, None),
            interest_loan(dec!(500), None, None, false, None),
        ];

        let earnings = InterestCalculator::total_interest_earned(&loans);

        // principal counts every loan, interest only the bearing ones
        assert_eq!(earnings.total_principal, dec!(2500));
        assert_eq!(earnings.by_type.simple.interest, dec!(60));
        assert_eq!(earnings.by_type.compound.interest, dec!(61.21));
        assert_eq!(earnings.total_interest, dec!(121.21));
        assert_eq!(earnings.total_amount, dec!(2621.21));

        // shares are percentages of the total interest
        let simple_share = earnings.by_type.simple.amount;
        let compound_share = earnings.by_type.compound.amount;
        assert!((simple_share + compound_share - dec!(100)).abs() <= dec!(0.02));
    }

    #[test]
    fn test_total_interest_earned_uses_paid_date_when_settled() {
        let paid_early = interest_loan(
            dec!(1000),
            Some(dec!(2)),
            Some(InterestType::Simple),
            true,
            Some(dt(2026, 2, 1)),
        );
        let earnings = InterestCalculator::total_interest_earned(&[paid_early]);

        // one month instead of three
        assert_eq!(earnings.total_interest, dec!(20));
    }

    #[test]
    fn test_total_interest_earned_zero_guard() {
        let earnings =
            InterestCalculator::total_interest_earned(&[interest_loan(dec!(100), None, None, false, None)]);
        assert_eq!(earnings.total_interest, dec!(0));
        assert_eq!(earnings.by_type.simple.amount, dec!(0));
        assert_eq!(earnings.by_type.compound.amount, dec!(0));
    }

    #[test]
    fn test_monthly_interest() {
        assert_eq!(
            InterestCalculator::monthly_interest(dec!(1000), dec!(2), PeriodRule::Monthly),
            dec!(20)
        );
        assert_eq!(
            InterestCalculator::monthly_interest(dec!(1000), dec!(12), PeriodRule::Annual),
            dec!(10)
        );
    }
}
