use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Interest convention for a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestType {
    /// principal × rate × periods, non-compounding
    Simple,
    /// principal × (1 + rate)^periods − principal
    Compound,
}

impl InterestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Compound => "COMPOUND",
        }
    }
}

impl std::fmt::Display for InterestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for InterestType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "SIMPLE" => Ok(Self::Simple),
            "COMPOUND" => Ok(Self::Compound),
            _ => Err(format!("Invalid interest type: {}", value)),
        }
    }
}

/// Period the stored interest rate refers to.
///
/// The stored string forms (`MENSAL`/`ANUAL`) are kept for compatibility
/// with existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodRule {
    #[serde(rename = "MENSAL")]
    Monthly,
    #[serde(rename = "ANUAL")]
    Annual,
}

impl PeriodRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "MENSAL",
            Self::Annual => "ANUAL",
        }
    }
}

impl std::fmt::Display for PeriodRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for PeriodRule {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "MENSAL" => Ok(Self::Monthly),
            "ANUAL" => Ok(Self::Annual),
            _ => Err(format!("Invalid period rule: {}", value)),
        }
    }
}

/// A tracked lending obligation with principal, due date, and optional
/// interest terms. Owned exclusively by the creating user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub user_id: String,
    pub borrower_name: String,
    /// Principal amount, always positive
    pub amount: Decimal,
    pub category_id: String,
    /// Ledger transaction this loan originated from, if any
    pub transaction_id: Option<String>,
    pub due_date: NaiveDateTime,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// Percent per period (see `period_rule`), non-negative when present
    pub interest_rate: Option<Decimal>,
    pub interest_type: Option<InterestType>,
    pub period_rule: Option<PeriodRule>,
    pub market_reference: Option<Decimal>,
    /// Interest projected at creation time from rate and duration
    pub expected_profit: Option<Decimal>,
    pub is_recurring_interest: bool,
    pub recurring_interest_day: Option<i32>,
    pub is_paid: bool,
    pub paid_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// Creation payload for a loan, shared by the direct, from-transaction
/// and batch paths.
#[derive(Debug, Clone, Deserialize)]
pub struct LoanDraft {
    pub borrower_name: String,
    pub amount: Decimal,
    pub category_id: String,
    pub due_date: NaiveDateTime,
    pub transaction_id: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub interest_rate: Option<Decimal>,
    pub interest_type: Option<InterestType>,
    pub period_rule: Option<PeriodRule>,
    pub market_reference: Option<Decimal>,
    pub expected_profit: Option<Decimal>,
    #[serde(default)]
    pub is_recurring_interest: bool,
    pub recurring_interest_day: Option<i32>,
    pub created_at: Option<NaiveDateTime>,
}

impl Loan {
    /// Build a loan from a draft. `created_at` falls back to `now`.
    pub fn from_draft(user_id: String, draft: LoanDraft, now: NaiveDateTime) -> Result<Self> {
        if draft.amount <= Decimal::ZERO {
            return Err(AppError::validation("Loan amount must be positive"));
        }

        if let Some(rate) = draft.interest_rate {
            if rate < Decimal::ZERO {
                return Err(AppError::validation("Interest rate cannot be negative"));
            }
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            borrower_name: draft.borrower_name,
            amount: draft.amount,
            category_id: draft.category_id,
            transaction_id: draft.transaction_id,
            due_date: draft.due_date,
            description: draft.description,
            notes: draft.notes,
            interest_rate: draft.interest_rate,
            interest_type: draft.interest_type,
            period_rule: draft.period_rule,
            market_reference: draft.market_reference,
            expected_profit: draft.expected_profit,
            is_recurring_interest: draft.is_recurring_interest,
            recurring_interest_day: draft.recurring_interest_day,
            is_paid: false,
            paid_date: None,
            created_at: draft.created_at.unwrap_or(now),
        })
    }

    /// Ownership check with the not-found merge: a loan owned by someone
    /// else is indistinguishable from a missing one.
    pub fn ensure_owned_by(&self, user_id: &str) -> Result<()> {
        if self.user_id != user_id {
            return Err(AppError::not_found("Loan not found"));
        }
        Ok(())
    }

    /// Flag the loan as settled. Calling this on an already-paid loan
    /// simply rewrites `paid_date`.
    pub fn mark_as_paid(&mut self, now: NaiveDateTime) {
        self.is_paid = true;
        self.paid_date = Some(now);
    }

    /// Undo a settlement, returning the loan to the unpaid state.
    pub fn reverse_payment(&mut self) {
        self.is_paid = false;
        self.paid_date = None;
    }
}
