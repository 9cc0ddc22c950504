pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use controllers::configure;
pub use models::Transaction;
pub use repositories::TransactionRepository;
pub use services::TransactionService;
