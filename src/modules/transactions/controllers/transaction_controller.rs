// HTTP handlers for transaction classification.
//
// Endpoints:
// - PUT /transactions/{id}/classify  Classify, record payments, open loans

use actix_web::{web, HttpResponse};
use sqlx::MySqlPool;

use crate::core::Result;
use crate::middleware::AuthenticatedUser;
use crate::modules::transactions::services::{ClassifyTransactionRequest, TransactionService};

/// PUT /transactions/{id}/classify
pub async fn classify_transaction(
    user: web::ReqData<AuthenticatedUser>,
    pool: web::Data<MySqlPool>,
    id: web::Path<String>,
    body: web::Json<ClassifyTransactionRequest>,
) -> Result<HttpResponse> {
    let service = TransactionService::new(pool.get_ref().clone());
    let transaction = service
        .classify(&id, &user.user_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(transaction))
}
