// HTTP handlers for recurring interest installments.
//
// Endpoints:
// - POST /loans/recurring-interest/generate       Generate pending months
// - POST /loans/recurring-interest/pay            Settle one month
// - PUT  /loans/recurring-interest/{id}/reverse   Undo a settlement
// - GET  /loans/recurring-interest/pending        Active loans with unpaid months
// - GET  /loans/recurring-interest/summary        Month-by-month totals

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::MySqlPool;

use crate::core::Result;
use crate::middleware::AuthenticatedUser;
use crate::modules::loans::services::{
    GenerateRecurringInterestRequest, PayRecurringInterestRequest, RecurringInterestService,
};

#[derive(Debug, Deserialize)]
pub struct RecurringSummaryQuery {
    #[serde(default = "default_months_back")]
    pub months_back: u32,
}

fn default_months_back() -> u32 {
    12
}

/// POST /loans/recurring-interest/generate
pub async fn generate_recurring_interest(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    body: web::Json<GenerateRecurringInterestRequest>,
) -> Result<HttpResponse> {
    let service = RecurringInterestService::new(pool.get_ref().clone());
    let created = service
        .generate_payments(&body.loan_id, &user.user_id, body.months_ahead)
        .await?;

    Ok(HttpResponse::Created().json(created))
}

/// POST /loans/recurring-interest/pay
pub async fn pay_recurring_interest(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    body: web::Json<PayRecurringInterestRequest>,
) -> Result<HttpResponse> {
    let service = RecurringInterestService::new(pool.get_ref().clone());
    let payment = service.pay(&user.user_id, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(payment))
}

/// PUT /loans/recurring-interest/{id}/reverse
pub async fn reverse_recurring_interest(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let service = RecurringInterestService::new(pool.get_ref().clone());
    let payment = service.reverse(&id, &user.user_id).await?;

    Ok(HttpResponse::Ok().json(payment))
}

/// GET /loans/recurring-interest/pending
pub async fn get_pending_recurring_interest(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse> {
    let service = RecurringInterestService::new(pool.get_ref().clone());
    let pending = service.get_pending(&user.user_id).await?;

    Ok(HttpResponse::Ok().json(pending))
}

/// GET /loans/recurring-interest/summary?months_back=
pub async fn get_recurring_interest_summary(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    query: web::Query<RecurringSummaryQuery>,
) -> Result<HttpResponse> {
    let service = RecurringInterestService::new(pool.get_ref().clone());
    let summary = service
        .get_summary(&user.user_id, query.months_back)
        .await?;

    Ok(HttpResponse::Ok().json(summary))
}
