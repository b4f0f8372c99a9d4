//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness
//! GET  /health/ready                            - Readiness (database ping)
//!
//! # Tenant
//! GET  /api/tenant                              - Current tenant and connections
//! PUT  /api/tenant/webhook                      - Set default webhook URL
//! GET  /api/tenant/connections                  - List platform connections
//! PUT  /api/tenant/connections/{platform}       - Create or replace a connection
//! DELETE /api/tenant/connections/{platform}     - Remove a connection
//!
//! # WooCommerce
//! GET|POST /api/woocommerce/products
//! GET|PUT|DELETE /api/woocommerce/products/{id}
//! POST /api/woocommerce/products/batch
//! GET|PUT /api/woocommerce/products/{id}/seo
//! GET  /api/woocommerce/categories
//!
//! # WordPress
//! GET|POST /api/wordpress/posts
//! GET|PUT /api/wordpress/posts/{id}
//! GET  /api/wordpress/pages
//! GET|PUT /api/wordpress/pages/{id}
//! GET  /api/wordpress/media/{id}
//! GET|PUT /api/wordpress/{kind}/{id}/seo
//! GET  /api/wordpress/{kind}/{id}/content      - Page builder text and images
//!
//! # Shopify
//! GET|POST /api/shopify/products
//! GET|PUT|DELETE /api/shopify/products/{id}
//! GET|PUT /api/shopify/products/{id}/seo
//!
//! # AI
//! POST /api/ai/seo | /api/ai/description | /api/ai/translate
//!
//! # SEO
//! POST /api/seo/checklist
//!
//! # Store provisioning
//! POST /api/stores
//! GET  /api/stores/jobs
//! GET  /api/stores/jobs/{id}
//! GET  /api/stores/jobs/{id}/events
//! POST /api/stores/jobs/{id}/webhook           - Redeliver the job webhook
//!
//! # Tables
//! GET  /api/tables/{table_id}
//! ```

mod connect;

pub mod ai;
pub mod health;
pub mod seo;
pub mod shopify;
pub mod stores;
pub mod tables;
pub mod tenant;
pub mod woocommerce;
pub mod wordpress;

use axum::Router;

use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(tenant::router())
        .merge(woocommerce::router())
        .merge(wordpress::router())
        .merge(shopify::router())
        .merge(ai::router())
        .merge(seo::router())
        .merge(stores::router())
        .merge(tables::router())
}
