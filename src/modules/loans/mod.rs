pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::{InterestType, Loan, LoanDraft, LoanPayment, PeriodRule, RecurringInterestPayment};
pub use repositories::{LoanPaymentRepository, LoanRepository, RecurringInterestRepository};
pub use services::{InterestCalculator, LoanService, RecurringInterestService};
