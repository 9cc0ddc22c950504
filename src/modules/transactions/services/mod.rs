pub mod transaction_service;

pub use transaction_service::{
    ClassifyPaymentItem, ClassifyTransactionRequest, TransactionService,
};
