//! Import orchestration - the upload / mapping / preview / commit pipeline
//!
//! An [`ImportSession`] drives one CSV import from raw file bytes to a
//! committed, reconciled set of records. Persistence runs strictly
//! sequentially: each batch suspends the session until the store answers,
//! which keeps the running progress counter meaningful and bounds memory.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Client, ColumnMapping, ImportField, ImportKind, Receivable, SerializedMapping};
use crate::ports::{AuthProvider, AuthUser, ProfileStore, RecordStore};
use crate::services::transform::{transform_client, transform_receivable, FieldIndex};
use crate::services::{headers, resolver};

/// Rows shown in the pre-commit preview
pub const PREVIEW_ROWS: usize = 5;

/// Upsert batch size; the hosted store rejects larger writes
pub const BATCH_SIZE: usize = 20;

/// Entry point for imports: holds the collaborators and opens sessions
pub struct ImportService {
    store: Arc<dyn RecordStore>,
    profiles: Arc<dyn ProfileStore>,
    auth: Arc<dyn AuthProvider>,
}

impl ImportService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        profiles: Arc<dyn ProfileStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            store,
            profiles,
            auth,
        }
    }

    /// Open an import session for the current user
    ///
    /// The roster and the saved mapping are fetched once, here; they are
    /// not refreshed for the lifetime of the session.
    pub async fn begin(&self, kind: ImportKind) -> Result<ImportSession> {
        let owner = self
            .auth
            .current_user()
            .await?
            .ok_or(Error::Unauthenticated)?;
        let roster = self.store.list_clients(owner.id).await?;
        let saved_mapping = self.profiles.load_mapping(owner.id).await?;

        debug!(
            kind = ?kind,
            roster = roster.len(),
            has_saved_mapping = saved_mapping.is_some(),
            "import session opened"
        );

        Ok(ImportSession {
            store: Arc::clone(&self.store),
            profiles: Arc::clone(&self.profiles),
            owner,
            kind,
            stage: ImportStage::Upload,
            headers: Vec::new(),
            rows: Vec::new(),
            mapping: ColumnMapping::new(),
            saved_mapping,
            roster,
            pending_clients: HashMap::new(),
        })
    }
}

/// Stages of the import state machine
///
/// Forward path is Upload -> Mapping -> Preview -> Importing; Preview can
/// step back to Mapping, and a failed commit drops back from Importing to
/// Preview so the user retries without re-uploading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Upload,
    Mapping,
    Preview,
    Importing,
}

impl ImportStage {
    fn name(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Mapping => "mapping",
            Self::Preview => "preview",
            Self::Importing => "importing",
        }
    }
}

/// One row of the pre-commit preview
#[derive(Debug, Clone)]
pub enum PreviewEntry {
    Receivable {
        receivable: Receivable,
        client_label: String,
        /// True when the client is an unmatched name that will be created
        /// at commit time
        new_client: bool,
    },
    Client {
        client: Client,
    },
}

/// Final result of a committed import
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Rows successfully written to the store
    pub imported: usize,
    /// Clients created for unmatched names
    pub clients_created: usize,
    /// Previously-imported receivables deleted by reconciliation
    pub deleted: usize,
    /// Batches skipped after a store failure
    pub batches_failed: usize,
}

/// One in-flight import, from file bytes to committed records
///
/// `Debug` is implemented manually because the `store`/`profiles`
/// trait-object fields are not `Debug`; they are elided from the output.
pub struct ImportSession {
    store: Arc<dyn RecordStore>,
    profiles: Arc<dyn ProfileStore>,
    owner: AuthUser,
    kind: ImportKind,
    stage: ImportStage,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    mapping: ColumnMapping,
    saved_mapping: Option<SerializedMapping>,
    roster: Vec<Client>,
    /// New-client candidates keyed by `"new-" + raw name`, session-scoped
    pending_clients: HashMap<String, Client>,
}

impl std::fmt::Debug for ImportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportSession")
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .field("stage", &self.stage)
            .field("headers", &self.headers)
            .field("rows", &self.rows)
            .field("mapping", &self.mapping)
            .field("saved_mapping", &self.saved_mapping)
            .field("roster", &self.roster)
            .field("pending_clients", &self.pending_clients)
            .finish_non_exhaustive()
    }
}

impl ImportSession {
    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    fn expect_stage(&self, expected: ImportStage) -> Result<()> {
        if self.stage != expected {
            return Err(Error::InvalidState(self.stage.name()));
        }
        Ok(())
    }

    /// Parse the uploaded file and reconcile its header row
    ///
    /// Accepts exactly one file per session. The delimiter is sniffed
    /// between `,` and `;` on the header line. Parse failures abort here
    /// and leave the session in Upload for a retry.
    pub fn load_file(&mut self, bytes: &[u8]) -> Result<()> {
        self.expect_stage(ImportStage::Upload)?;

        let text = std::str::from_utf8(bytes)
            .map_err(|_| Error::parse("file is not valid UTF-8 text"))?;
        let delimiter = sniff_delimiter(text);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut grid: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            grid.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        let Some(header_row) = grid.first() else {
            return Err(Error::parse("file contains no rows"));
        };

        self.headers = header_row.iter().map(|h| h.trim().to_string()).collect();
        self.rows = grid.split_off(1);
        self.mapping = headers::reconcile(self.kind, &self.headers, self.saved_mapping.as_ref());
        self.stage = ImportStage::Mapping;

        debug!(
            rows = self.rows.len(),
            columns = self.headers.len(),
            "file parsed"
        );
        Ok(())
    }

    /// Assign a header to a field tag (mapping stage only)
    pub fn assign_column(&mut self, header: &str, field: ImportField) -> Result<()> {
        self.expect_stage(ImportStage::Mapping)?;
        self.mapping.assign(header, field);
        Ok(())
    }

    /// Clear the assignment for a header (mapping stage only)
    pub fn unassign_column(&mut self, header: &str) -> Result<()> {
        self.expect_stage(ImportStage::Mapping)?;
        self.mapping.unassign(header);
        Ok(())
    }

    /// Save the active mapping as the user's default for future imports
    pub async fn save_mapping_as_default(&self) -> Result<()> {
        let blob = self.mapping.to_saved()?;
        self.profiles.save_mapping(self.owner.id, &blob).await
    }

    /// Validate required fields and build the preview slice
    ///
    /// Blocks with [`Error::MappingIncomplete`] while required tags are
    /// unassigned. On success the session moves to the Preview stage.
    pub fn preview(&mut self) -> Result<Vec<PreviewEntry>> {
        self.expect_stage(ImportStage::Mapping)?;

        let missing = headers::missing_required(self.kind, &self.mapping);
        if !missing.is_empty() {
            return Err(Error::MappingIncomplete(missing));
        }

        let index = FieldIndex::build(&self.headers, &self.mapping);
        let today = Utc::now().date_naive();
        let mut entries = Vec::new();

        for row in self.rows.iter().take(PREVIEW_ROWS) {
            match self.kind {
                ImportKind::Receivables => {
                    let raw_name = index.text(ImportField::Client, row).unwrap_or_default();
                    let (client_id, label, new_client) =
                        match resolver::resolve(&raw_name, &self.roster) {
                            Some(client) => (client.id, client.company_name.clone(), false),
                            None => {
                                let placeholder = self
                                    .pending_clients
                                    .entry(format!("new-{raw_name}"))
                                    .or_insert_with(|| {
                                        Client::placeholder(self.owner.id, &raw_name)
                                    });
                                (placeholder.id, placeholder.company_name.clone(), true)
                            }
                        };
                    let receivable =
                        transform_receivable(row, &index, self.owner.id, client_id, today);
                    entries.push(PreviewEntry::Receivable {
                        receivable,
                        client_label: label,
                        new_client,
                    });
                }
                ImportKind::Clients => {
                    if let Some(client) = transform_client(row, &index, self.owner.id) {
                        entries.push(PreviewEntry::Client { client });
                    }
                }
            }
        }

        self.stage = ImportStage::Preview;
        Ok(entries)
    }

    /// Step back from the preview to edit the mapping again
    pub fn back_to_mapping(&mut self) -> Result<()> {
        self.expect_stage(ImportStage::Preview)?;
        self.stage = ImportStage::Mapping;
        Ok(())
    }

    /// Commit the import over the entire file
    ///
    /// `progress` receives the running imported-row count after each batch.
    /// On failure the session returns to the Preview stage so the user can
    /// retry from a known-good state; once committing, there is no
    /// cancellation.
    pub async fn commit(&mut self, mut progress: impl FnMut(usize) + Send) -> Result<ImportOutcome> {
        self.expect_stage(ImportStage::Preview)?;
        self.stage = ImportStage::Importing;

        let result = match self.kind {
            ImportKind::Receivables => self.commit_receivables(&mut progress).await,
            ImportKind::Clients => self.commit_clients(&mut progress).await,
        };

        if result.is_err() {
            self.stage = ImportStage::Preview;
        }
        result
    }

    async fn commit_receivables(
        &mut self,
        progress: &mut (impl FnMut(usize) + Send),
    ) -> Result<ImportOutcome> {
        let index = FieldIndex::build(&self.headers, &self.mapping);
        let today = Utc::now().date_naive();

        // Snapshot of what exists before the import, for reconciliation
        let existing = self.store.list_receivables(self.owner.id).await?;

        // Phase 1: promote every tracked placeholder to a real client and
        // record the temporary-id -> real-id rewrite table.
        let mut id_rewrite: HashMap<Uuid, Uuid> = HashMap::new();
        let mut clients_created = 0usize;
        if !self.pending_clients.is_empty() {
            let placeholders: Vec<Client> = self.pending_clients.values().cloned().collect();
            let created = self.store.insert_clients(&placeholders).await?;
            if created.len() != placeholders.len() {
                return Err(Error::store("client insert returned a short row set"));
            }
            for (placeholder, real) in placeholders.iter().zip(created.iter()) {
                id_rewrite.insert(placeholder.id, real.id);
            }
            clients_created += created.len();
            info!(created = created.len(), "new clients created from import");
            self.roster.extend(created);
        }

        // Phase 2: re-run the pipeline over the whole file, not just the
        // preview slice. Unresolved names at this point are created inline;
        // phase 1 should have covered them, but the preview only visited
        // the first rows.
        let mut receivables: Vec<Receivable> = Vec::new();
        for row_index in 0..self.rows.len() {
            let row = &self.rows[row_index];
            let raw_name = index.text(ImportField::Client, row).unwrap_or_default();

            let roster_id = resolver::resolve(&raw_name, &self.roster).map(|c| c.id);
            let pending_id = self
                .pending_clients
                .get(&format!("new-{raw_name}"))
                .map(|p| *id_rewrite.get(&p.id).unwrap_or(&p.id));

            let client_id = match roster_id.or(pending_id) {
                Some(id) => id,
                None => {
                    let placeholder = Client::placeholder(self.owner.id, &raw_name);
                    let created = self.store.insert_clients(&[placeholder]).await?;
                    let real = created
                        .into_iter()
                        .next()
                        .ok_or_else(|| Error::store("client insert returned no rows"))?;
                    clients_created += 1;
                    let id = real.id;
                    self.roster.push(real);
                    id
                }
            };

            let receivable = transform_receivable(
                &self.rows[row_index],
                &index,
                self.owner.id,
                client_id,
                today,
            );
            if receivable.is_importable() {
                receivables.push(receivable);
            }
        }

        if receivables.is_empty() {
            return Err(Error::NothingImported);
        }

        // The declarative key set of this file: reconciliation never
        // deletes an invoice the file still references, even if its batch
        // failed to write.
        let imported_keys: HashSet<&str> = receivables
            .iter()
            .map(|r| r.invoice_number.as_str())
            .collect();

        // Phase 3: sequential batched upsert, partial-success policy
        let mut imported = 0usize;
        let mut batches_failed = 0usize;
        let mut touched_clients: HashSet<Uuid> = HashSet::new();
        for batch in receivables.chunks(BATCH_SIZE) {
            match self.store.upsert_receivables(batch).await {
                Ok(written) => {
                    imported += written.len();
                    touched_clients.extend(written.iter().map(|r| r.client_id));
                    progress(imported);
                }
                Err(err) => {
                    warn!(batch_size = batch.len(), "skipping failed batch: {err}");
                    batches_failed += 1;
                }
            }
        }

        if imported == 0 {
            return Err(Error::NothingImported);
        }

        // Phase 4: every client touched by an imported receivable now needs
        // a reminder pass.
        let touched: Vec<Uuid> = touched_clients.into_iter().collect();
        self.store
            .set_needs_reminder(self.owner.id, &touched, true)
            .await?;

        // Phase 5: reconciliation delete. The file is the source of truth
        // for the owner's full receivable set; whatever it no longer lists
        // is removed.
        let stale: Vec<String> = existing
            .iter()
            .filter(|r| !imported_keys.contains(r.invoice_number.as_str()))
            .map(|r| r.invoice_number.clone())
            .collect();
        if !stale.is_empty() {
            self.store
                .delete_receivables_by_invoice(self.owner.id, &stale)
                .await?;
        }

        info!(
            imported,
            clients_created,
            deleted = stale.len(),
            batches_failed,
            "import committed"
        );

        Ok(ImportOutcome {
            imported,
            clients_created,
            deleted: stale.len(),
            batches_failed,
        })
    }

    async fn commit_clients(
        &mut self,
        progress: &mut (impl FnMut(usize) + Send),
    ) -> Result<ImportOutcome> {
        let index = FieldIndex::build(&self.headers, &self.mapping);

        let clients: Vec<Client> = self
            .rows
            .iter()
            .filter_map(|row| transform_client(row, &index, self.owner.id))
            .collect();

        if clients.is_empty() {
            return Err(Error::NothingImported);
        }

        let mut imported = 0usize;
        let mut batches_failed = 0usize;
        for batch in clients.chunks(BATCH_SIZE) {
            match self.store.insert_clients(batch).await {
                Ok(written) => {
                    imported += written.len();
                    progress(imported);
                }
                Err(err) => {
                    warn!(batch_size = batch.len(), "skipping failed batch: {err}");
                    batches_failed += 1;
                }
            }
        }

        if imported == 0 {
            return Err(Error::NothingImported);
        }

        info!(imported, batches_failed, "client import committed");
        Ok(ImportOutcome {
            imported,
            clients_created: imported,
            deleted: 0,
            batches_failed,
        })
    }
}

/// Pick `;` over `,` when the header line leans that way; French exports
/// commonly use semicolons.
fn sniff_delimiter(text: &str) -> u8 {
    let header_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let commas = header_line.matches(',').count();
    let semicolons = header_line.matches(';').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter("Client;Facture,SA;Montant"), b';');
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(ImportStage::Upload.name(), "upload");
        assert_eq!(ImportStage::Importing.name(), "importing");
    }
}
