//! Tenant-scoped WhatsApp contact registry.
//!
//! Every query carries a `tenant_id` predicate; a contact is unique per
//! (tenant, owning client, phone number) and that uniqueness is enforced by
//! the store, not by callers. Numbers are normalized before they are
//! persisted — an unnormalized number never reaches the table.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::phone::validate_phone_number;

/// Default result cap for [`search_contacts`].
const SEARCH_LIMIT: i64 = 50;

/// Row type returned by SQLite queries for contacts.
type ContactRow = (
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    i64,
    Option<String>,
    String,
    String,
);

/// Errors from the contact registry.
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The phone number failed validation.
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
}

/// A persisted WhatsApp contact.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Contact {
    /// Store-assigned identifier.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Owning client record, if attached to one.
    pub client_id: Option<String>,
    /// Canonical `+`-prefixed phone number.
    pub phone_number: String,
    /// Display name, if known.
    pub name: Option<String>,
    /// Whether the number has been confirmed reachable on WhatsApp.
    pub is_verified: bool,
    /// RFC 3339 timestamp of the last verification, if any.
    pub last_verified_at: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 last-update timestamp.
    pub updated_at: String,
}

/// Optional filters for [`list_contacts`].
#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    /// Restrict to contacts owned by this client.
    pub client_id: Option<String>,
    /// Restrict by verification state.
    pub is_verified: Option<bool>,
    /// Substring match on name or phone number.
    pub query: Option<String>,
    /// Maximum rows returned; `None` means unbounded.
    pub limit: Option<i64>,
    /// Rows to skip for pagination.
    pub offset: Option<i64>,
}

/// Aggregate counts over a tenant's contacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ContactStats {
    /// All contacts.
    pub total: i64,
    /// Contacts marked verified.
    pub verified: i64,
    /// Contacts not yet verified.
    pub unverified: i64,
    /// Contacts attached to a client record.
    pub with_client: i64,
    /// Contacts without a client record.
    pub without_client: i64,
}

fn row_to_contact(row: ContactRow) -> Contact {
    Contact {
        id: row.0,
        tenant_id: row.1,
        client_id: row.2,
        phone_number: row.3,
        name: row.4,
        is_verified: row.5 != 0,
        last_verified_at: row.6,
        created_at: row.7,
        updated_at: row.8,
    }
}

const CONTACT_COLUMNS: &str = "id, tenant_id, client_id, phone_number, name, \
     is_verified, last_verified_at, created_at, updated_at";

/// List a tenant's contacts, applying the given filters.
///
/// Ordered by name, then number. An absent limit returns every match.
///
/// # Errors
///
/// Returns [`ContactError::Database`] on SQLite failure.
pub async fn list_contacts(
    db: &SqlitePool,
    tenant_id: &str,
    filter: &ContactFilter,
) -> Result<Vec<Contact>, ContactError> {
    let pattern = filter.query.as_ref().map(|q| format!("%{q}%"));
    let verified = filter.is_verified.map(i64::from);
    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM whatsapp_contacts \
         WHERE tenant_id = ?1 \
           AND (?2 IS NULL OR client_id = ?2) \
           AND (?3 IS NULL OR is_verified = ?3) \
           AND (?4 IS NULL OR name LIKE ?4 OR phone_number LIKE ?4) \
         ORDER BY name ASC, phone_number ASC \
         LIMIT ?5 OFFSET ?6"
    );
    let rows: Vec<ContactRow> = sqlx::query_as(&sql)
        .bind(tenant_id)
        .bind(&filter.client_id)
        .bind(verified)
        .bind(&pattern)
        .bind(filter.limit.unwrap_or(-1))
        .bind(filter.offset.unwrap_or(0))
        .fetch_all(db)
        .await?;
    trace!(tenant_id, count = rows.len(), "contacts listed");
    Ok(rows.into_iter().map(row_to_contact).collect())
}

/// Search a tenant's contacts by name or number substring.
///
/// An empty query is a wildcard: it matches everything, bounded by the
/// default limit of 50.
///
/// # Errors
///
/// Returns [`ContactError::Database`] on SQLite failure.
pub async fn search_contacts(
    db: &SqlitePool,
    tenant_id: &str,
    query: &str,
) -> Result<Vec<Contact>, ContactError> {
    let filter = ContactFilter {
        query: if query.is_empty() {
            None
        } else {
            Some(query.to_owned())
        },
        limit: Some(SEARCH_LIMIT),
        ..ContactFilter::default()
    };
    list_contacts(db, tenant_id, &filter).await
}

/// Save a WhatsApp number for a client, upserting on
/// (tenant, client, number).
///
/// The number is validated and normalized first; an existing row keeps its
/// id and verification state and only refreshes the name and update stamp.
///
/// # Errors
///
/// Returns [`ContactError::InvalidPhone`] with the validator's message if
/// the number is rejected, or [`ContactError::Database`] on SQLite failure.
pub async fn save_contact(
    db: &SqlitePool,
    client_id: Option<&str>,
    phone_number: &str,
    tenant_id: &str,
    name: Option<&str>,
) -> Result<Contact, ContactError> {
    let validation = validate_phone_number(phone_number);
    let Some(formatted) = validation.formatted_number else {
        return Err(ContactError::InvalidPhone(
            validation
                .error
                .unwrap_or_else(|| "Invalid phone number format".to_owned()),
        ));
    };

    let now = Utc::now().to_rfc3339();
    let existing: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM whatsapp_contacts \
         WHERE tenant_id = ?1 AND client_id IS ?2 AND phone_number = ?3",
    )
    .bind(tenant_id)
    .bind(client_id)
    .bind(&formatted)
    .fetch_optional(db)
    .await?;

    if let Some((id,)) = existing {
        sqlx::query("UPDATE whatsapp_contacts SET name = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(name)
            .bind(&now)
            .bind(&id)
            .execute(db)
            .await?;
        debug!(tenant_id, contact_id = %id, "contact updated");
        return load_contact(db, tenant_id, &id).await;
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO whatsapp_contacts \
         (id, tenant_id, client_id, phone_number, name, is_verified, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)",
    )
    .bind(&id)
    .bind(tenant_id)
    .bind(client_id)
    .bind(&formatted)
    .bind(name)
    .bind(&now)
    .execute(db)
    .await?;
    debug!(tenant_id, contact_id = %id, "contact created");
    load_contact(db, tenant_id, &id).await
}

/// Load one contact by id within a tenant.
///
/// # Errors
///
/// Returns [`ContactError::Database`] on SQLite failure, including
/// `RowNotFound` when the id does not exist for the tenant.
pub async fn load_contact(
    db: &SqlitePool,
    tenant_id: &str,
    contact_id: &str,
) -> Result<Contact, ContactError> {
    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM whatsapp_contacts WHERE tenant_id = ?1 AND id = ?2"
    );
    let row: ContactRow = sqlx::query_as(&sql)
        .bind(tenant_id)
        .bind(contact_id)
        .fetch_one(db)
        .await?;
    Ok(row_to_contact(row))
}

/// Mark a number verified, stamping the verification time.
///
/// Returns whether a contact matched. An invalid number verifies nothing.
///
/// # Errors
///
/// Returns [`ContactError::Database`] on SQLite failure.
pub async fn verify_contact(
    db: &SqlitePool,
    tenant_id: &str,
    phone_number: &str,
) -> Result<bool, ContactError> {
    let Some(formatted) = validate_phone_number(phone_number).formatted_number else {
        return Ok(false);
    };

    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "UPDATE whatsapp_contacts \
         SET is_verified = 1, last_verified_at = ?1, updated_at = ?1 \
         WHERE tenant_id = ?2 AND phone_number = ?3",
    )
    .bind(&now)
    .bind(tenant_id)
    .bind(&formatted)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a contact by id. Tenant-scoped; returns whether a row was removed.
///
/// # Errors
///
/// Returns [`ContactError::Database`] on SQLite failure.
pub async fn delete_contact(
    db: &SqlitePool,
    tenant_id: &str,
    contact_id: &str,
) -> Result<bool, ContactError> {
    let result = sqlx::query("DELETE FROM whatsapp_contacts WHERE tenant_id = ?1 AND id = ?2")
        .bind(tenant_id)
        .bind(contact_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Aggregate counts for a tenant's contacts.
///
/// # Errors
///
/// Returns [`ContactError::Database`] on SQLite failure.
pub async fn contact_stats(db: &SqlitePool, tenant_id: &str) -> Result<ContactStats, ContactError> {
    let row: (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), \
                COALESCE(SUM(CASE WHEN is_verified = 1 THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN client_id IS NOT NULL THEN 1 ELSE 0 END), 0) \
         FROM whatsapp_contacts WHERE tenant_id = ?1",
    )
    .bind(tenant_id)
    .fetch_one(db)
    .await?;

    let (total, verified, with_client) = row;
    Ok(ContactStats {
        total,
        verified,
        unverified: total.saturating_sub(verified),
        with_client,
        without_client: total.saturating_sub(with_client),
    })
}
