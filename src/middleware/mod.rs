pub mod auth;
pub mod request_id;

pub use auth::{hash_api_token, verify_api_token, ApiTokenAuth, AuthenticatedUser};
pub use request_id::RequestId;
