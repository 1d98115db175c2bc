//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod client;
mod mapping;
mod receivable;
pub mod result;

pub use client::{Client, ReminderLevel, DEFAULT_REMINDER_DELAYS, REMINDER_LEVELS};
pub use mapping::{ColumnMapping, ImportField, ImportKind, SerializedMapping};
pub use receivable::{Receivable, ReceivableStatus};
