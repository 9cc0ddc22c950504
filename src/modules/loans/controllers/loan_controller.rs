// HTTP handlers for the loan lifecycle.
//
// Endpoints:
// - POST   /loans                        Create a loan
// - POST   /loans/from-transaction      Create a loan from a ledger transaction
// - POST   /loans/batch                 Create several loans atomically
// - GET    /loans                       List loans with balances
// - GET    /loans/summary               Aggregate book summary
// - GET    /loans/interest-earnings     Interest earnings report
// - GET    /loans/{id}                  Fetch one loan
// - PUT    /loans/{id}                  Partial update
// - PUT    /loans/{id}/mark-as-paid     Flag as settled
// - PUT    /loans/{id}/reverse-payment  Undo settlement
// - DELETE /loans/{id}                  Hard delete

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::MySqlPool;

use crate::core::Result;
use crate::middleware::AuthenticatedUser;
use crate::modules::loans::models::LoanDraft;
use crate::modules::loans::services::{
    CreateLoanBatchRequest, CreateLoanFromTransactionRequest, LoanService, UpdateLoanRequest,
};

#[derive(Debug, Deserialize)]
pub struct LoanListQuery {
    pub is_paid: Option<bool>,
}

/// POST /loans
pub async fn create_loan(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    body: web::Json<LoanDraft>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let loan = service.create_loan(&user.user_id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(loan))
}

/// POST /loans/from-transaction
pub async fn create_loan_from_transaction(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateLoanFromTransactionRequest>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let loan = service
        .create_from_transaction(&user.user_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(loan))
}

/// POST /loans/batch
pub async fn create_loan_batch(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateLoanBatchRequest>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let loans = service.create_batch(&user.user_id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(loans))
}

/// GET /loans?is_paid=
pub async fn get_loans(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    query: web::Query<LoanListQuery>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let loans = service.get_loans(&user.user_id, query.is_paid).await?;

    Ok(HttpResponse::Ok().json(loans))
}

/// GET /loans/summary
pub async fn get_loans_summary(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let summary = service.get_loans_summary(&user.user_id).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// GET /loans/interest-earnings
pub async fn get_interest_earnings(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let report = service.get_interest_earnings(&user.user_id).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// GET /loans/{id}
pub async fn get_loan(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let loan = service.get_loan(&id, &user.user_id).await?;

    Ok(HttpResponse::Ok().json(loan))
}

/// PUT /loans/{id}
pub async fn update_loan(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    id: web::Path<String>,
    body: web::Json<UpdateLoanRequest>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let loan = service
        .update_loan(&id, &user.user_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(loan))
}

/// PUT /loans/{id}/mark-as-paid
pub async fn mark_as_paid(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let loan = service.mark_as_paid(&id, &user.user_id).await?;

    Ok(HttpResponse::Ok().json(loan))
}

/// PUT /loans/{id}/reverse-payment
pub async fn reverse_payment(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    let loan = service.reverse_payment(&id, &user.user_id).await?;

    Ok(HttpResponse::Ok().json(loan))
}

/// DELETE /loans/{id}
pub async fn delete_loan(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let service = LoanService::new(pool.get_ref().clone());
    service.delete_loan(&id, &user.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
