#![allow(missing_docs)]

//! docrelay command-line interface.
//!
//! One-shot subcommands over the document pipeline: phone validation,
//! document sends (with optional retry-queue drain), delivery status
//! lookup, and tenant contact management.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use chrono::Utc;

use docrelay::channel::cloud_api::{CloudApiClient, CloudApiConfig};
use docrelay::channel::registry::ChannelRegistry;
use docrelay::config::RelayConfig;
use docrelay::contacts::{self, ContactFilter};
use docrelay::phone::validate_phone_number;
use docrelay::queue::memory::MemoryQueue;
use docrelay::send::{
    DocumentKind, DocumentMetadata, DocumentSender, Recipient, SendDocumentRequest,
};
use docrelay::worker::RetryWorker;
use docrelay::{status, store};

#[derive(Parser)]
#[command(name = "docrelay", version, about = "WhatsApp document delivery pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and normalize a phone number.
    Validate {
        /// Raw phone number, any formatting.
        number: String,
    },
    /// Send a document file to one or more recipients.
    Send {
        /// Tenant to send as (must be configured).
        #[arg(long)]
        tenant: String,
        /// Path to the document file.
        #[arg(long)]
        file: PathBuf,
        /// Recipient phone number; repeatable.
        #[arg(long = "to", required = true)]
        recipients: Vec<String>,
        /// Caption override.
        #[arg(long)]
        message: Option<String>,
        /// Document kind.
        #[arg(long, value_enum, default_value_t = CliKind::Invoice)]
        kind: CliKind,
        /// Document id in the business store.
        #[arg(long, default_value = "adhoc")]
        document_id: String,
        /// Process the retry queue until empty before exiting.
        #[arg(long)]
        drain: bool,
    },
    /// Look up delivery status for a provider message id.
    Status {
        /// Provider message id.
        message_id: String,
    },
    /// Manage a tenant's WhatsApp contacts.
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },
}

#[derive(Subcommand)]
enum ContactsAction {
    /// List contacts, optionally filtered by a substring query.
    List {
        #[arg(long)]
        tenant: String,
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Save (upsert) a contact number.
    Save {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        number: String,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Mark a number as verified.
    Verify {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        number: String,
    },
    /// Delete a contact by id.
    Delete {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        id: String,
    },
    /// Show aggregate contact counts.
    Stats {
        #[arg(long)]
        tenant: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliKind {
    Invoice,
    DeliveryNote,
    Proforma,
}

impl From<CliKind> for DocumentKind {
    fn from(kind: CliKind) -> Self {
        match kind {
            CliKind::Invoice => Self::Invoice,
            CliKind::DeliveryNote => Self::DeliveryNote,
            CliKind::Proforma => Self::Proforma,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    // Drain mode keeps the process alive through retries, so it gets the
    // rotating JSON log file; everything else logs to stderr only.
    let _logging_guard = match &cli.command {
        Command::Send { drain: true, .. } => {
            Some(docrelay::logging::init_production(Path::new("logs"))?)
        }
        _ => {
            docrelay::logging::init_cli();
            None
        }
    };
    match cli.command {
        Command::Validate { number } => {
            let validation = validate_phone_number(&number);
            println!("{}", serde_json::to_string_pretty(&validation)?);
            if validation.is_valid {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Send {
            tenant,
            file,
            recipients,
            message,
            kind,
            document_id,
            drain,
        } => run_send(tenant, file, recipients, message, kind, document_id, drain).await,
        Command::Status { message_id } => {
            let config = RelayConfig::load()?;
            let db = store::open(&config.store.path)
                .await
                .context("failed to open store")?;
            store::init_schema(&db).await?;
            let result = status::delivery_status(&db, &message_id).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Contacts { action } => run_contacts(action).await,
    }
}

/// Build the per-tenant channel registry from configuration.
fn build_registry(config: &RelayConfig) -> ChannelRegistry {
    let mut registry = ChannelRegistry::new();
    for tenant in config.tenants.iter().filter(|t| t.active) {
        let client = CloudApiClient::new(CloudApiConfig {
            phone_number_id: tenant.phone_number_id.clone(),
            access_token: tenant.access_token.clone(),
            api_version: tenant.api_version.clone(),
            base_url: tenant.base_url.clone(),
        });
        registry.register(&tenant.id, Arc::new(client));
    }
    registry
}

#[allow(clippy::too_many_arguments)]
async fn run_send(
    tenant: String,
    file: PathBuf,
    recipients: Vec<String>,
    message: Option<String>,
    kind: CliKind,
    document_id: String,
    drain: bool,
) -> Result<ExitCode> {
    let config = RelayConfig::load()?;
    let tenant_config = config
        .tenant(&tenant)
        .with_context(|| format!("tenant {tenant} is not configured"))?;
    anyhow::ensure!(tenant_config.active, "tenant {tenant} is not active");

    let registry = Arc::new(build_registry(&config));
    let channel = registry
        .get(&tenant)
        .with_context(|| format!("no channel registered for tenant {tenant}"))?;

    let document = std::fs::read(&file)
        .with_context(|| format!("failed to read document {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_owned());
    let size = u64::try_from(document.len()).unwrap_or(u64::MAX);

    let request = SendDocumentRequest {
        tenant_id: tenant,
        document,
        filename,
        recipients: recipients
            .into_iter()
            .map(|phone_number| Recipient {
                phone_number,
                name: None,
                client_id: None,
            })
            .collect(),
        custom_message: message,
        metadata: DocumentMetadata {
            id: document_id,
            kind: kind.into(),
            size,
            client_id: None,
            created_at: Utc::now(),
        },
    };

    let queue = Arc::new(MemoryQueue::new());
    let sender = DocumentSender::new(channel, Arc::clone(&queue) as _);
    let response = sender.send_document(&request).await;

    let sent = response
        .results
        .iter()
        .filter(|r| r.success)
        .count();
    println!(
        "{sent} sent, {} queued (will retry), {} failed",
        response.queued_count, response.failed_count
    );
    for result in &response.results {
        if let Some(error) = &result.error {
            eprintln!("  {}: {error}", result.recipient.phone_number);
        }
    }

    if drain && response.queued_count > 0 {
        let worker = RetryWorker::with_poll_interval(
            registry,
            queue,
            std::time::Duration::from_secs(config.worker.poll_interval_secs),
        );
        worker
            .drain()
            .await
            .context("retry queue drain failed")?;
    }

    if response.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn run_contacts(action: ContactsAction) -> Result<ExitCode> {
    let config = RelayConfig::load()?;
    let db = store::open(&config.store.path)
        .await
        .context("failed to open store")?;
    store::init_schema(&db).await?;

    match action {
        ContactsAction::List { tenant, query } => {
            let results = if query.is_empty() {
                contacts::list_contacts(&db, &tenant, &ContactFilter::default()).await?
            } else {
                contacts::search_contacts(&db, &tenant, &query).await?
            };
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        ContactsAction::Save {
            tenant,
            number,
            client,
            name,
        } => {
            let contact =
                contacts::save_contact(&db, client.as_deref(), &number, &tenant, name.as_deref())
                    .await?;
            println!("{}", serde_json::to_string_pretty(&contact)?);
        }
        ContactsAction::Verify { tenant, number } => {
            let matched = contacts::verify_contact(&db, &tenant, &number).await?;
            println!("{}", if matched { "verified" } else { "no matching contact" });
        }
        ContactsAction::Delete { tenant, id } => {
            let removed = contacts::delete_contact(&db, &tenant, &id).await?;
            println!("{}", if removed { "deleted" } else { "no matching contact" });
        }
        ContactsAction::Stats { tenant } => {
            let stats = contacts::contact_stats(&db, &tenant).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}
