pub mod loan_controller;
pub mod recurring_interest_controller;

use actix_web::web;

pub use loan_controller::{
    create_loan, create_loan_batch, create_loan_from_transaction, delete_loan,
    get_interest_earnings, get_loan, get_loans, get_loans_summary, mark_as_paid, reverse_payment,
    update_loan,
};
pub use recurring_interest_controller::{
    generate_recurring_interest, get_pending_recurring_interest, get_recurring_interest_summary,
    pay_recurring_interest, reverse_recurring_interest,
};

/// Mount the loan routes. Fixed segments are registered before the `{id}`
/// catch-all so `/loans/summary` never resolves as a loan id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/loans")
            .route("", web::post().to(create_loan))
            .route("", web::get().to(get_loans))
            .route("/from-transaction", web::post().to(create_loan_from_transaction))
            .route("/batch", web::post().to(create_loan_batch))
            .route("/summary", web::get().to(get_loans_summary))
            .route("/interest-earnings", web::get().to(get_interest_earnings))
            .route(
                "/recurring-interest/generate",
                web::post().to(generate_recurring_interest),
            )
            .route(
                "/recurring-interest/pay",
                web::post().to(pay_recurring_interest),
            )
            .route(
                "/recurring-interest/pending",
                web::get().to(get_pending_recurring_interest),
            )
            .route(
                "/recurring-interest/summary",
                web::get().to(get_recurring_interest_summary),
            )
            .route(
                "/recurring-interest/{id}/reverse",
                web::put().to(reverse_recurring_interest),
            )
            .route("/{id}", web::get().to(get_loan))
            .route("/{id}", web::put().to(update_loan))
            .route("/{id}/mark-as-paid", web::put().to(mark_as_paid))
            .route("/{id}/reverse-payment", web::put().to(reverse_payment))
            .route("/{id}", web::delete().to(delete_loan)),
    );
}
