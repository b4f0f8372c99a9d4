//! Generative-AI integration (Anthropic Messages API, non-streaming).
//!
//! [`AiClient`] sends single-turn requests; the generators in [`generate`]
//! turn them into SEO suggestions, product descriptions, translations and
//! store templates. Model output that must be structured is requested as
//! JSON and read back with [`extract_json`].

mod client;
mod error;
pub mod generate;
mod prompts;
mod types;

pub use client::AiClient;
pub use error::AiError;
pub use generate::{MAX_TRANSLATION_TARGETS, extract_json};
pub use types::*;
