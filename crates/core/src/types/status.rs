//! Status enums for platforms and store-creation jobs.

use serde::{Deserialize, Serialize};

/// External platform a tenant can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "platform", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    WooCommerce,
    WordPress,
    Shopify,
}

impl Platform {
    /// All supported platforms.
    pub const ALL: [Self; 3] = [Self::WooCommerce, Self::WordPress, Self::Shopify];

    /// Lowercase identifier used in URLs and storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WooCommerce => "woocommerce",
            Self::WordPress => "wordpress",
            Self::Shopify => "shopify",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "woocommerce" => Ok(Self::WooCommerce),
            "wordpress" => Ok(Self::WordPress),
            "shopify" => Ok(Self::Shopify),
            _ => Err(format!("invalid platform: {s}")),
        }
    }
}

/// Status of a Shopify store-creation job.
///
/// ```text
/// Pending ──► CreatingStore ──► Populating ──► Completed
///    │              │               │
///    └──────────────┴───────────────┴────────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "job_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, pipeline not started yet.
    Pending,
    /// Shopify CLI is creating the development store.
    CreatingStore,
    /// Store exists; products, collections and pages are being created.
    Populating,
    /// Pipeline finished.
    Completed,
    /// Pipeline stopped on an error.
    Failed,
}

impl JobStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::CreatingStore | Self::Failed)
                | (Self::CreatingStore, Self::Populating | Self::Failed)
                | (Self::Populating, Self::Completed | Self::Failed)
        )
    }

    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// The pipeline is doing work for this job right now.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::CreatingStore | Self::Populating)
    }

    /// Snake-case identifier, identical to the serialized form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::CreatingStore => "creating_store",
            Self::Populating => "populating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "creating_store" => Ok(Self::CreatingStore),
            "populating" => Ok(Self::Populating),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid job status: {s}")),
        }
    }
}
