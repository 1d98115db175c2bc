//! Record store port - persistence abstraction

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Client, Receivable};

/// Record store abstraction
///
/// This trait defines all persistence operations the import core needs.
/// Every operation is scoped to an owner; implementations (adapters) provide
/// the actual storage logic. Upserts resolve conflicts on the
/// `(owner_id, invoice_number)` tuple.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // === Clients ===

    /// All clients belonging to an owner
    async fn list_clients(&self, owner_id: Uuid) -> Result<Vec<Client>>;

    /// Insert new clients, returning the persisted rows (with final ids)
    async fn insert_clients(&self, clients: &[Client]) -> Result<Vec<Client>>;

    /// Update an existing client
    async fn update_client(&self, client: &Client) -> Result<()>;

    /// Set the `needs_reminder` flag on a set of clients
    async fn set_needs_reminder(
        &self,
        owner_id: Uuid,
        client_ids: &[Uuid],
        needs_reminder: bool,
    ) -> Result<()>;

    /// Delete a client and cascade to its receivables
    async fn delete_client(&self, owner_id: Uuid, client_id: Uuid) -> Result<()>;

    // === Receivables ===

    /// All receivables belonging to an owner
    async fn list_receivables(&self, owner_id: Uuid) -> Result<Vec<Receivable>>;

    /// Upsert receivables, conflict key `(owner_id, invoice_number)`
    ///
    /// Re-importing an invoice number updates the existing row rather than
    /// duplicating it. Returns the persisted rows.
    async fn upsert_receivables(&self, rows: &[Receivable]) -> Result<Vec<Receivable>>;

    /// Update an existing receivable
    async fn update_receivable(&self, row: &Receivable) -> Result<()>;

    /// Delete the receivables whose invoice numbers are listed
    async fn delete_receivables_by_invoice(
        &self,
        owner_id: Uuid,
        invoice_numbers: &[String],
    ) -> Result<()>;
}
