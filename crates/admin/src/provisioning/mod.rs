//! Shopify development store provisioning.
//!
//! - [`service`] - job orchestration (`POST /api/stores`)
//! - [`cli`] - Shopify CLI runner and output parser
//! - [`template`] - store templates
//! - [`populate`] - creating template items in a new store
//! - [`webhook`] - signed job webhooks with retry

pub mod cli;
pub mod populate;
pub mod service;
pub mod template;
pub mod webhook;

pub use populate::{PopulateReport, populate_shopify_store};
pub use service::{
    CreateStoreRequest, PopulateSource, ProvisioningError, ProvisioningService, expire_stale_jobs,
};
pub use template::StoreTemplate;
pub use webhook::{DeliveryOutcome, WebhookPayload, WebhookSender};
