//! JSON API handlers under `/api`.
//!
//! Every failure is `{"ok": false, "error": "<code>"}` with a matching
//! status (see [`ApiError`]).

pub mod admin;
pub mod callback;
pub mod crm;
pub mod import;
pub mod meta;
pub mod owner;
pub mod team;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::middleware::rate_limit::{forwarded_ip, hashed_ip, user_agent};
use crate::models::ClientFingerprint;

/// `Json<T>` whose rejection is the `invalid_input` envelope.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Rejected JSON body");
                Err(ApiError::invalid_input())
            }
        }
    }
}

/// Client address and user agent as seen through the proxy.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub ip_hash: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    /// Presence-tracking fingerprint (hashed IP, raw user agent).
    #[must_use]
    pub fn fingerprint(&self) -> ClientFingerprint {
        ClientFingerprint {
            ip_hash: self.ip_hash.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            ip: forwarded_ip(&parts.headers),
            ip_hash: hashed_ip(&parts.headers),
            user_agent: user_agent(&parts.headers),
        })
    }
}

/// `{"ok": true}`.
pub(crate) fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Trimmed text, `None` when blank.
pub(crate) fn clean(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_drops_blank_values() {
        assert_eq!(clean(Some("  a b ")), Some("a b"));
        assert_eq!(clean(Some("   ")), None);
        assert_eq!(clean(None), None);
    }
}
