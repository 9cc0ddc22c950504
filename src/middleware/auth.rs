use crate::core::AppError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use futures_util::future::LocalBoxFuture;
use sqlx::MySqlPool;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Identity of the caller, resolved from the API token.
///
/// Every operation in the service takes the owner id from here; the
/// business layer never resolves identity on its own.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// API token authentication middleware
pub struct ApiTokenAuth {
    pool: MySqlPool,
}

impl ApiTokenAuth {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiTokenAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiTokenAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiTokenAuthMiddleware {
            service: Rc::new(service),
            pool: self.pool.clone(),
        }))
    }
}

pub struct ApiTokenAuthMiddleware<S> {
    service: Rc<S>,
    pool: MySqlPool,
}

impl<S, B> Service<ServiceRequest> for ApiTokenAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let pool = self.pool.clone();

        Box::pin(async move {
            // Health and root endpoints stay open
            let path = req.path();
            if path == "/health" || path == "/" {
                return svc.call(req).await;
            }

            // Extract token from X-API-Key header
            let api_key = req
                .headers()
                .get("X-API-Key")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
                .ok_or_else(|| Error::from(AppError::unauthorized("Missing X-API-Key header")))?;

            let token_record = validate_api_token(&pool, &api_key)
                .await
                .map_err(Error::from)?;

            // Make the owner id available to handlers
            req.extensions_mut().insert(AuthenticatedUser {
                user_id: token_record.user_id.clone(),
            });

            svc.call(req).await
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ApiTokenRecord {
    id: String,
    user_id: String,
    token_hash: String,
}

async fn validate_api_token(pool: &MySqlPool, api_key: &str) -> crate::core::Result<ApiTokenRecord> {
    let records = sqlx::query_as::<_, ApiTokenRecord>(
        r#"
        SELECT id, user_id, token_hash
        FROM api_tokens
        WHERE is_active = TRUE
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(AppError::Database)?;

    let record = records
        .into_iter()
        .find(|r| verify_api_token(api_key, &r.token_hash).unwrap_or(false))
        .ok_or_else(|| AppError::unauthorized("Invalid API key"))?;

    // Update last_used_at timestamp (fire and forget)
    let _ = sqlx::query("UPDATE api_tokens SET last_used_at = NOW() WHERE id = ?")
        .bind(&record.id)
        .execute(pool)
        .await;

    Ok(record)
}

/// Hash an API token with Argon2 for storage
pub fn hash_api_token(api_key: &str) -> crate::core::Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(api_key.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash API token: {}", e)))
}

/// Verify an API token against its stored Argon2 hash
pub fn verify_api_token(api_key: &str, hash: &str) -> crate::core::Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;

    let argon2 = Argon2::default();

    Ok(argon2
        .verify_password(api_key.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_api_token() {
        let api_key = "test_key_123";
        let hash = hash_api_token(api_key).unwrap();

        assert!(verify_api_token(api_key, &hash).unwrap());
        assert!(!verify_api_token("wrong_key", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_api_token("key", "not-a-phc-string").is_err());
    }
}
