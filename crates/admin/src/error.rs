//! Unified error handling for the admin API.
//!
//! Every handler returns `Result<_, AppError>`. Responses are JSON
//! `{"error": "..."}` (plus `retry_after` on 429). Server errors are captured
//! to Sentry; their details never reach the client.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::ai::AiError;
use crate::builders::BuilderError;
use crate::db::RepositoryError;
use crate::provisioning::ProvisioningError;
use crate::shopify::ShopifyError;
use crate::woocommerce::WooError;
use crate::wordpress::WpError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("WooCommerce error: {0}")]
    WooCommerce(#[from] WooError),

    #[error("WordPress error: {0}")]
    WordPress(#[from] WpError),

    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Generative AI provider failed.
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Page builder error: {0}")]
    Builder(#[from] BuilderError),

    #[error("Provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid API key.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with the tenant's current setup.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How an upstream failure is reported.
enum Upstream {
    NotFound,
    RateLimited(u64),
    /// Upstream rejected the request content.
    Rejected,
    /// The stored connection itself is unusable.
    Misconfigured,
    Failed,
}

impl Upstream {
    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Rejected => StatusCode::BAD_REQUEST,
            Self::Misconfigured => StatusCode::CONFLICT,
            Self::Failed => StatusCode::BAD_GATEWAY,
        }
    }
}

const fn client_error(status: u16) -> Upstream {
    if matches!(status, 400..=499) {
        Upstream::Rejected
    } else {
        Upstream::Failed
    }
}

fn woo_upstream(err: &WooError) -> Upstream {
    match err {
        WooError::NotFound(_) => Upstream::NotFound,
        WooError::RateLimited(secs) => Upstream::RateLimited(*secs),
        WooError::Api { status, .. } => client_error(*status),
        WooError::InvalidUrl(_) => Upstream::Misconfigured,
        WooError::Http(_) | WooError::Unauthorized | WooError::Parse(_) => Upstream::Failed,
    }
}

fn wp_upstream(err: &WpError) -> Upstream {
    match err {
        WpError::NotFound(_) => Upstream::NotFound,
        WpError::RateLimited(secs) => Upstream::RateLimited(*secs),
        WpError::Api { status, .. } => client_error(*status),
        WpError::InvalidUrl(_) => Upstream::Misconfigured,
        WpError::Http(_) | WpError::Unauthorized | WpError::Parse(_) => Upstream::Failed,
    }
}

fn shopify_upstream(err: &ShopifyError) -> Upstream {
    match err {
        ShopifyError::NotFound(_) => Upstream::NotFound,
        ShopifyError::RateLimited(secs) => Upstream::RateLimited(*secs),
        ShopifyError::Validation(_) => Upstream::Rejected,
        ShopifyError::Api { status, .. } => client_error(*status),
        ShopifyError::InvalidDomain(_) => Upstream::Misconfigured,
        ShopifyError::Http(_) | ShopifyError::Unauthorized | ShopifyError::Parse(_) => {
            Upstream::Failed
        }
    }
}

impl AppError {
    fn upstream(&self) -> Option<Upstream> {
        match self {
            Self::WooCommerce(e) => Some(woo_upstream(e)),
            Self::WordPress(e) => Some(wp_upstream(e)),
            Self::Shopify(e) | Self::Provisioning(ProvisioningError::Shopify(e)) => {
                Some(shopify_upstream(e))
            }
            Self::Ai(AiError::RateLimited(secs)) => Some(Upstream::RateLimited(*secs)),
            Self::Ai(_) | Self::Builder(_) | Self::Provisioning(_) => Some(Upstream::Failed),
            _ => None,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Ai(AiError::InvalidInput(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Ai(AiError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Provisioning(e) => provisioning_status(e)
                .unwrap_or_else(|| self.upstream().map_or(StatusCode::BAD_GATEWAY, |u| u.status())),
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => self
                .upstream()
                .map_or(StatusCode::INTERNAL_SERVER_ERROR, |u| u.status()),
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self.upstream() {
            Some(Upstream::RateLimited(secs)) => Some(secs),
            _ => None,
        }
    }

    fn public_message(&self, status: StatusCode) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(message)) => message.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Provisioning(ProvisioningError::Repository(_)) => {
                "Internal server error".to_string()
            }
            Self::Ai(AiError::Config(_)) => "Internal server error".to_string(),
            Self::Ai(AiError::InvalidInput(message))
            | Self::Provisioning(ProvisioningError::InvalidRequest(message))
            | Self::NotFound(message)
            | Self::Unauthorized(message)
            | Self::BadRequest(message)
            | Self::Conflict(message) => message.clone(),
            _ if status == StatusCode::TOO_MANY_REQUESTS => "Upstream rate limit reached".to_string(),
            _ => self.to_string(),
        }
    }
}

const fn provisioning_status(err: &ProvisioningError) -> Option<StatusCode> {
    match err {
        ProvisioningError::InvalidRequest(_) => Some(StatusCode::BAD_REQUEST),
        ProvisioningError::NotFound | ProvisioningError::Repository(RepositoryError::NotFound) => {
            Some(StatusCode::NOT_FOUND)
        }
        ProvisioningError::NotConfigured
        | ProvisioningError::NotTerminal(_)
        | ProvisioningError::Superseded { .. } => Some(StatusCode::CONFLICT),
        ProvisioningError::Repository(_) | ProvisioningError::Serialize(_) => {
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        }
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let message = self.public_message(status);
        let retry_after = self.retry_after();

        let body = retry_after.map_or_else(
            || json!({ "error": message }),
            |secs| json!({ "error": message, "retry_after": secs }),
        );
        let mut response = (status, Json(body)).into_response();

        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

/// Tag Sentry events with the authenticated tenant.
pub fn set_sentry_tenant(tenant_id: &str, name: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(tenant_id.to_string()),
            username: Some(name.to_string()),
            ..Default::default()
        }));
    });
}
