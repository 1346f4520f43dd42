//! Static shared-secret check on the `X-API-KEY` header

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::domain::DomainError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The secret every request must present
#[derive(Clone)]
pub struct ApiKeySecret(Arc<str>);

impl ApiKeySecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }

    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

/// Proof that the request carried the configured API key
#[derive(Debug)]
pub struct ApiKey;

#[async_trait]
impl<S> FromRequestParts<S> for ApiKey
where
    ApiKeySecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let secret = ApiKeySecret::from_ref(state);

        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or(DomainError::Unauthorized)?;

        if !secret.matches(presented) {
            tracing::warn!("Rejected request to {} with a wrong API key", parts.uri.path());
            return Err(DomainError::Unauthorized);
        }

        Ok(ApiKey)
    }
}

/// Route layer that rejects the request before any handler extractor runs.
pub async fn require_api_key(_key: ApiKey, request: Request, next: Next) -> Response {
    next.run(request).await
}
