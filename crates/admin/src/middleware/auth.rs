//! Tenant API key authentication.
//!
//! Keys are sent as `Authorization: Bearer mdk_...`. Only the SHA-256 hash
//! of a key is stored; lookups go through a short-lived in-memory cache so
//! a busy UI does not hit the database on every request.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde_json::json;
use sha2::{Digest, Sha256};

use merchdesk_core::TenantId;

use crate::db::tenants::{self, Tenant};
use crate::error::set_sentry_tenant;
use crate::state::AppState;

/// Prefix of every tenant API key.
pub const API_KEY_PREFIX: &str = "mdk_";
const API_KEY_BYTES: usize = 32;

/// The authenticated tenant.
#[derive(Debug, Clone)]
pub struct CurrentTenant {
    pub id: TenantId,
    pub name: String,
    pub webhook_url: Option<String>,
}

impl From<Tenant> for CurrentTenant {
    fn from(tenant: Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name,
            webhook_url: tenant.webhook_url,
        }
    }
}

/// Extractor that requires a valid tenant API key.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireTenant(tenant): RequireTenant) -> impl IntoResponse {
///     format!("Hello, {}!", tenant.name)
/// }
/// ```
pub struct RequireTenant(pub CurrentTenant);

/// Why a request was not authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantAuthRejection {
    MissingKey,
    InvalidKey,
    /// Tenant lookup failed; the key may be valid.
    Unavailable,
}

impl IntoResponse for TenantAuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingKey => (StatusCode::UNAUTHORIZED, "Missing API key"),
            Self::InvalidKey => (StatusCode::UNAUTHORIZED, "Invalid API key"),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication temporarily unavailable",
            ),
        };
        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl FromRequestParts<AppState> for RequireTenant {
    type Rejection = TenantAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = bearer_token(parts).ok_or(TenantAuthRejection::MissingKey)?;
        if !key.starts_with(API_KEY_PREFIX) {
            return Err(TenantAuthRejection::InvalidKey);
        }

        let hash = hash_api_key(key);
        if let Some(tenant) = state.tenant_cache().get(&hash).await {
            set_sentry_tenant(&tenant.id.to_string(), &tenant.name);
            return Ok(Self(tenant.into()));
        }

        let tenant = tenants::get_by_api_key_hash(state.pool(), &hash)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Tenant lookup failed");
                TenantAuthRejection::Unavailable
            })?
            .ok_or(TenantAuthRejection::InvalidKey)?;

        set_sentry_tenant(&tenant.id.to_string(), &tenant.name);
        state.tenant_cache().insert(hash, tenant.clone()).await;
        Ok(Self(tenant.into()))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Generate a new tenant API key (`mdk_` + 43 URL-safe base64 characters).
#[must_use]
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{API_KEY_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Lowercase hex SHA-256 of a key, as stored in `tenants.api_key_hash`.
#[must_use]
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/tenant");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_generate_api_key_shape() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 43);
        assert!(
            key.strip_prefix(API_KEY_PREFIX)
                .unwrap()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_hash_api_key() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_api_key("mdk_x").len(), 64);
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer mdk_abc"))), Some("mdk_abc"));
        assert_eq!(bearer_token(&parts(Some("bearer  mdk_abc "))), Some("mdk_abc"));
        assert_eq!(bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }

    #[test]
    fn test_rejection_status() {
        let response = TenantAuthRejection::InvalidKey.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[axum::http::header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(
            TenantAuthRejection::Unavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
