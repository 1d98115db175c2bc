//! In-memory adapter for all three ports
//!
//! Backs the integration tests and doubles as the reference adapter for
//! embedding the core without a hosted store. Like the hosted backend it
//! assigns server-side ids on insert, which is what makes the
//! placeholder-id rewrite during import commits observable.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Client, Receivable, SerializedMapping};
use crate::ports::{AuthProvider, AuthUser, ProfileStore, RecordStore};

#[derive(Default)]
struct State {
    clients: Vec<Client>,
    receivables: Vec<Receivable>,
    mappings: HashMap<Uuid, SerializedMapping>,
    user: Option<AuthUser>,
    /// Fault injection: any receivable batch containing this invoice
    /// number fails to upsert
    poison_invoice: Option<String>,
}

/// In-memory record/profile/auth backend
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the authenticated user returned by the auth port
    pub fn sign_in(&self, user: AuthUser) {
        if let Ok(mut state) = self.state.write() {
            state.user = Some(user);
        }
    }

    /// Make every upsert batch containing `invoice_number` fail
    pub fn poison_invoice(&self, invoice_number: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.poison_invoice = Some(invoice_number.into());
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| Error::store("state lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| Error::store("state lock poisoned"))
    }
}

#[async_trait]
impl RecordStore for MemoryBackend {
    async fn list_clients(&self, owner_id: Uuid) -> Result<Vec<Client>> {
        let state = self.read()?;
        Ok(state
            .clients
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn insert_clients(&self, clients: &[Client]) -> Result<Vec<Client>> {
        let mut state = self.write()?;
        let mut inserted = Vec::with_capacity(clients.len());
        for client in clients {
            let mut row = client.clone();
            // Server-side identity, as the hosted store would assign
            row.id = Uuid::new_v4();
            row.created_at = Utc::now();
            row.updated_at = row.created_at;
            state.clients.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn update_client(&self, client: &Client) -> Result<()> {
        let mut state = self.write()?;
        let found = state
            .clients
            .iter_mut()
            .find(|c| c.id == client.id && c.owner_id == client.owner_id);
        match found {
            Some(row) => {
                *row = client.clone();
                row.updated_at = Utc::now();
                Ok(())
            }
            None => Err(Error::not_found(format!("client {}", client.id))),
        }
    }

    async fn set_needs_reminder(
        &self,
        owner_id: Uuid,
        client_ids: &[Uuid],
        needs_reminder: bool,
    ) -> Result<()> {
        let mut state = self.write()?;
        for client in state
            .clients
            .iter_mut()
            .filter(|c| c.owner_id == owner_id && client_ids.contains(&c.id))
        {
            client.needs_reminder = needs_reminder;
            client.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_client(&self, owner_id: Uuid, client_id: Uuid) -> Result<()> {
        let mut state = self.write()?;
        state
            .clients
            .retain(|c| !(c.owner_id == owner_id && c.id == client_id));
        // Cascade to dependents
        state
            .receivables
            .retain(|r| !(r.owner_id == owner_id && r.client_id == client_id));
        Ok(())
    }

    async fn list_receivables(&self, owner_id: Uuid) -> Result<Vec<Receivable>> {
        let state = self.read()?;
        Ok(state
            .receivables
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn upsert_receivables(&self, rows: &[Receivable]) -> Result<Vec<Receivable>> {
        let mut state = self.write()?;

        if let Some(poison) = &state.poison_invoice {
            if rows.iter().any(|r| &r.invoice_number == poison) {
                return Err(Error::store("simulated batch failure"));
            }
        }

        let mut written = Vec::with_capacity(rows.len());
        for row in rows {
            let position = state.receivables.iter().position(|r| {
                r.owner_id == row.owner_id && r.invoice_number == row.invoice_number
            });
            match position {
                Some(i) => {
                    // Conflict on (owner_id, invoice_number): update in
                    // place, keeping the original identity
                    let current = &mut state.receivables[i];
                    let id = current.id;
                    let created_at = current.created_at;
                    *current = row.clone();
                    current.id = id;
                    current.created_at = created_at;
                    current.updated_at = Utc::now();
                    written.push(current.clone());
                }
                None => {
                    let mut fresh = row.clone();
                    fresh.id = Uuid::new_v4();
                    fresh.created_at = Utc::now();
                    fresh.updated_at = fresh.created_at;
                    state.receivables.push(fresh.clone());
                    written.push(fresh);
                }
            }
        }
        Ok(written)
    }

    async fn update_receivable(&self, row: &Receivable) -> Result<()> {
        let mut state = self.write()?;
        let found = state
            .receivables
            .iter_mut()
            .find(|r| r.id == row.id && r.owner_id == row.owner_id);
        match found {
            Some(current) => {
                *current = row.clone();
                current.updated_at = Utc::now();
                Ok(())
            }
            None => Err(Error::not_found(format!("receivable {}", row.id))),
        }
    }

    async fn delete_receivables_by_invoice(
        &self,
        owner_id: Uuid,
        invoice_numbers: &[String],
    ) -> Result<()> {
        let mut state = self.write()?;
        state.receivables.retain(|r| {
            !(r.owner_id == owner_id && invoice_numbers.contains(&r.invoice_number))
        });
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryBackend {
    async fn load_mapping(&self, user_id: Uuid) -> Result<Option<SerializedMapping>> {
        let state = self.read()?;
        Ok(state.mappings.get(&user_id).cloned())
    }

    async fn save_mapping(&self, user_id: Uuid, mapping: &SerializedMapping) -> Result<()> {
        let mut state = self.write()?;
        state.mappings.insert(user_id, mapping.clone());
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn current_user(&self) -> Result<Option<AuthUser>> {
        let state = self.read()?;
        Ok(state.user.clone())
    }
}
