//! Authenticated dashboard user, resolved from the bearer session token.
//!
//! Every invoice route takes an `AuthUser`; requests without a valid token
//! are rejected with 401 before any storage access happens.

use crate::services::SessionVerifier;
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use service_core::error::AppError;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Owner id for all repository calls.
    pub user_id: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<SessionVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
            })?;

        let sessions = Arc::<SessionVerifier>::from_ref(state);
        let claims = sessions.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
        })?;

        tracing::Span::current().record("user_id", claims.sub.as_str());

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
