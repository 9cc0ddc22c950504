use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One monthly interest-only charge for a loan with recurring interest.
///
/// At most one row exists per (loan, reference month); the reference month
/// is always normalized to the first day of its calendar month.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecurringInterestPayment {
    pub id: String,
    pub loan_id: String,
    /// Calendar month the charge is attributed to, day pinned to 1
    pub reference_month: NaiveDate,
    pub amount: Decimal,
    pub is_paid: bool,
    pub paid_date: Option<NaiveDateTime>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Normalize any date to the first day of its month.
pub fn reference_month_of(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

impl RecurringInterestPayment {
    /// A freshly generated, unpaid installment.
    pub fn new_pending(
        loan_id: String,
        reference_month: NaiveDate,
        amount: Decimal,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            loan_id,
            reference_month: reference_month_of(reference_month),
            amount,
            is_paid: false,
            paid_date: None,
            transaction_id: None,
            notes: None,
            created_at: now,
        }
    }

    /// An installment created directly in the paid state, for months that
    /// were settled before the generator ever produced them.
    pub fn new_paid(
        loan_id: String,
        reference_month: NaiveDate,
        amount: Decimal,
        transaction_id: Option<String>,
        notes: Option<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            loan_id,
            reference_month: reference_month_of(reference_month),
            amount,
            is_paid: true,
            paid_date: Some(now),
            transaction_id,
            notes,
            created_at: now,
        }
    }

    /// Settle this installment. `amount`, `transaction_id` and `notes`
    /// overwrite stored values only when the caller supplied them.
    pub fn settle(
        &mut self,
        amount: Option<Decimal>,
        transaction_id: Option<String>,
        notes: Option<String>,
        now: NaiveDateTime,
    ) {
        if let Some(amount) = amount {
            self.amount = amount;
        }
        if let Some(transaction_id) = transaction_id {
            self.transaction_id = Some(transaction_id);
        }
        if let Some(notes) = notes {
            self.notes = Some(notes);
        }
        self.is_paid = true;
        self.paid_date = Some(now);
    }

    /// Reverse a settlement. The amount is retained so the charge stays
    /// visible as pending.
    pub fn reverse(&mut self) {
        self.is_paid = false;
        self.paid_date = None;
        self.transaction_id = None;
    }

    /// Bucket key for month-by-month summaries, e.g. "2026-03".
    pub fn month_key(&self) -> String {
        format!(
            "{:04}-{:02}",
            self.reference_month.year(),
            self.reference_month.month()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_reference_month_normalization() {
        let mid_month = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        assert_eq!(reference_month_of(mid_month), first);
        assert_eq!(reference_month_of(first), first);

        let payment = RecurringInterestPayment::new_pending(
            "loan-1".to_string(),
            mid_month,
            dec!(25),
            now(),
        );
        assert_eq!(payment.reference_month, first);
    }

    #[test]
    fn test_settle_keeps_amount_when_none_supplied() {
        let month = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut payment =
            RecurringInterestPayment::new_pending("loan-1".to_string(), month, dec!(25), now());

        payment.settle(None, Some("tx-1".to_string()), None, now());

        assert!(payment.is_paid);
        assert_eq!(payment.amount, dec!(25));
        assert_eq!(payment.transaction_id, Some("tx-1".to_string()));
        assert!(payment.paid_date.is_some());
    }

    #[test]
    fn test_settle_overwrites_amount_when_supplied() {
        let month = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut payment =
            RecurringInterestPayment::new_pending("loan-1".to_string(), month, dec!(25), now());

        payment.settle(Some(dec!(30)), None, None, now());
        assert_eq!(payment.amount, dec!(30));
    }

    #[test]
    fn test_reverse_clears_link_but_keeps_amount() {
        let month = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut payment = RecurringInterestPayment::new_paid(
            "loan-1".to_string(),
            month,
            dec!(25),
            Some("tx-1".to_string()),
            None,
            now(),
        );

        payment.reverse();

        assert!(!payment.is_paid);
        assert!(payment.paid_date.is_none());
        assert!(payment.transaction_id.is_none());
        assert_eq!(payment.amount, dec!(25));
    }

    #[test]
    fn test_month_key() {
        let month = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let payment =
            RecurringInterestPayment::new_pending("loan-1".to_string(), month, dec!(25), now());
        assert_eq!(payment.month_key(), "2026-03");
    }
}
