pub mod interest_calculator;
pub mod loan_service;
pub mod loan_summary;
pub mod recurring_interest_service;

pub use interest_calculator::{
    InterestBreakdown, InterestCalculation, InterestCalculator, InterestEarnings,
};
pub use loan_service::{
    CreateLoanBatchRequest, CreateLoanFromTransactionRequest, InterestEarningsReport,
    LoanBatchItem, LoanOverview, LoanService, UpdateLoanRequest,
};
pub use loan_summary::{LoanSummaryBuilder, LoanWithPayments, LoansSummary};
pub use recurring_interest_service::{
    GenerateRecurringInterestRequest, PayRecurringInterestRequest, PendingRecurringInterest,
    RecurringInterestService,
};
