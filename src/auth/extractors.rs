use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::JwtKeys;

/// Identity of whoever sent the request. `None` means anonymous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caller(pub Option<i64>);

impl Caller {
    pub fn anonymous() -> Self {
        Caller(None)
    }

    pub fn user(user_id: i64) -> Self {
        Caller(Some(user_id))
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0
    }
}

/// Resolves the caller from an optional `Authorization: Bearer <access token>` header.
/// Anything unusable falls back to an anonymous caller instead of rejecting.
#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth) = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(Caller::anonymous());
        };

        let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
        else {
            warn!("invalid auth scheme; treating caller as anonymous");
            return Ok(Caller::anonymous());
        };

        match JwtKeys::from_ref(state).verify_access(token) {
            Ok(claims) => Ok(Caller::user(claims.sub)),
            Err(e) => {
                warn!(error = %e, "invalid or expired token; treating caller as anonymous");
                Ok(Caller::anonymous())
            }
        }
    }
}
