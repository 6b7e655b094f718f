//! Bearer-token authentication.

use crate::domain::error::LedgerError;
use crate::domain::model::User;
use crate::transport::http::handlers::common::ApiError;
use crate::transport::http::types::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// The user behind `Authorization: Bearer <token>`.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| LedgerError::Unauthorized("Missing bearer token".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or_else(|| LedgerError::Unauthorized("Missing bearer token".to_string()))?;
        let user = state.service.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}
