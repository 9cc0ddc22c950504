pub mod loan_payment_repository;
pub mod loan_repository;
pub mod recurring_interest_repository;

pub use loan_payment_repository::LoanPaymentRepository;
pub use loan_repository::LoanRepository;
pub use recurring_interest_repository::{RecurringInterestRepository, RecurringInterestWithLoan};
