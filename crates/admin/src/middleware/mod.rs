//! HTTP middleware for the admin API.
//!
//! # Layer Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. CORS for the admin UI origin
//! 4. Tenant authentication, per handler via [`auth::RequireTenant`]

pub mod auth;

pub use auth::{CurrentTenant, RequireTenant, generate_api_key, hash_api_key};
