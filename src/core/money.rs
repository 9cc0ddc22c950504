use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places for currency amounts
pub const CENT_SCALE: u32 = 2;

/// Rounds a monetary amount to cent precision.
///
/// Midpoints round away from zero, matching `round(x * 100) / 100`
/// semantics rather than banker's rounding.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// True if the amount is exactly representable as an integer number of cents.
pub fn is_cent_exact(amount: Decimal) -> bool {
    amount == round_cents(amount)
}
