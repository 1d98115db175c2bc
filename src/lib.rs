//! Relance Core - import and reminder logic for B2B invoice follow-up
//!
//! This crate implements the CSV import and column-reconciliation engine of
//! an invoice-reminder tool, following hexagonal architecture:
//!
//! - **domain**: Core business entities (Client, Receivable, ColumnMapping)
//! - **ports**: Trait definitions for external collaborators (RecordStore,
//!   ProfileStore, AuthProvider)
//! - **services**: The import pipeline (normalization, header
//!   reconciliation, client resolution, row transformation, orchestration)
//! - **adapters**: Concrete implementations (in-memory backend)
//!
//! The entry point is [`ImportService`]: wire it with the three ports, open
//! an [`ImportSession`], and drive the upload -> mapping -> preview ->
//! commit state machine from UI event handlers.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use adapters::MemoryBackend;
pub use domain::result::{Error, Result};
pub use domain::{
    Client, ColumnMapping, ImportField, ImportKind, Receivable, ReceivableStatus, ReminderLevel,
    SerializedMapping,
};
pub use ports::{AuthProvider, AuthUser, ProfileStore, RecordStore};
pub use services::{
    ImportOutcome, ImportService, ImportSession, ImportStage, PreviewEntry,
};
