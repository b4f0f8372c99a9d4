//! Merchdesk CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! md-cli migrate
//!
//! # Create a tenant (prints its API key once)
//! md-cli tenant create -n "Acme Retail" --webhook-url https://hooks.example.com/merchdesk
//!
//! # Import tenants and platform connections from YAML
//! md-cli tenant import tenants.yaml
//!
//! # Fail store jobs stuck for more than 90 minutes
//! md-cli jobs expire-stale --minutes 90
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `tenant create|import|rotate-key|list` - Manage tenants
//! - `jobs expire-stale` - Fail stuck store jobs

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use merchdesk_core::TenantId;

mod commands;

#[derive(Parser)]
#[command(name = "md-cli")]
#[command(author, version, about = "Merchdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage tenants
    Tenant {
        #[command(subcommand)]
        action: TenantAction,
    },
    /// Store job maintenance
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
}

#[derive(Subcommand)]
enum TenantAction {
    /// Create a tenant and print its API key
    Create {
        /// Tenant display name
        #[arg(short, long)]
        name: String,

        /// Default webhook URL for store jobs
        #[arg(long)]
        webhook_url: Option<String>,
    },
    /// Create tenants and their platform connections from a YAML file
    Import {
        /// Path to the YAML file
        file: String,
    },
    /// Replace a tenant's API key and print the new one
    RotateKey {
        /// Tenant ID
        #[arg(long)]
        id: TenantId,
    },
    /// List tenants
    List,
}

#[derive(Subcommand)]
enum JobsAction {
    /// Fail unfinished jobs that stopped progressing and send their webhooks
    ExpireStale {
        /// Age in minutes after which an unfinished job is stale
        /// (default: `JOB_STALE_AFTER_MINUTES` or 60)
        #[arg(long)]
        minutes: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Tenant { action } => match action {
            TenantAction::Create { name, webhook_url } => {
                commands::tenant::create(&name, webhook_url.as_deref()).await?;
            }
            TenantAction::Import { file } => commands::tenant::import(&file).await?,
            TenantAction::RotateKey { id } => commands::tenant::rotate_key(id).await?,
            TenantAction::List => commands::tenant::list().await?,
        },
        Commands::Jobs { action } => match action {
            JobsAction::ExpireStale { minutes } => commands::jobs::expire_stale(minutes).await?,
        },
    }
    Ok(())
}
