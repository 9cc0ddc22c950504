pub mod loan;
pub mod loan_payment;
pub mod recurring_interest_payment;

pub use loan::{InterestType, Loan, LoanDraft, PeriodRule};
pub use loan_payment::LoanPayment;
pub use recurring_interest_payment::{reference_month_of, RecurringInterestPayment};
