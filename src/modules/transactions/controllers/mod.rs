pub mod transaction_controller;

use actix_web::web;

pub use transaction_controller::classify_transaction;

/// Mount the transaction routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transactions")
            .route("/{id}/classify", web::put().to(classify_transaction)),
    );
}
