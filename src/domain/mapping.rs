//! Column mapping model
//!
//! A mapping links raw CSV header strings to canonical field tags. It is
//! edited during the mapping stage of an import, persisted per user as an
//! opaque JSON blob, and reused as the default on subsequent imports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Canonical field tags a CSV column can be assigned to
///
/// Receivable imports use the first ten tags; client imports use
/// `CompanyName` and `Email`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportField {
    Client,
    InvoiceNumber,
    Amount,
    PaidAmount,
    DueDate,
    Status,
    DocumentDate,
    InstallmentNumber,
    ManagementNumber,
    Code,
    CompanyName,
    Email,
}

impl ImportField {
    /// The snake_case tag string, as stored in the persisted blob
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::InvoiceNumber => "invoice_number",
            Self::Amount => "amount",
            Self::PaidAmount => "paid_amount",
            Self::DueDate => "due_date",
            Self::Status => "status",
            Self::DocumentDate => "document_date",
            Self::InstallmentNumber => "installment_number",
            Self::ManagementNumber => "management_number",
            Self::Code => "code",
            Self::CompanyName => "company_name",
            Self::Email => "email",
        }
    }
}

/// Which entity an import session targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Receivables,
    Clients,
}

impl ImportKind {
    /// Field tags that must be assigned before the mapping stage can be left
    pub fn required_fields(&self) -> &'static [ImportField] {
        match self {
            Self::Receivables => &[
                ImportField::Client,
                ImportField::InvoiceNumber,
                ImportField::Amount,
                ImportField::DueDate,
            ],
            Self::Clients => &[ImportField::CompanyName, ImportField::Email],
        }
    }
}

/// Mapping from raw header string to canonical field tag
///
/// Each tag is assigned to at most one header at a time; that constraint is
/// enforced here at the edit operation, not in the persisted blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMapping {
    // BTreeMap keeps serialization order stable across sessions
    entries: BTreeMap<String, ImportField>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a header to a field tag, stealing the tag from any other
    /// header that currently holds it
    pub fn assign(&mut self, header: impl Into<String>, field: ImportField) {
        self.entries.retain(|_, f| *f != field);
        self.entries.insert(header.into(), field);
    }

    /// Remove the assignment for a header ("do not import" this column)
    pub fn unassign(&mut self, header: &str) {
        self.entries.remove(header);
    }

    /// Field assigned to a header, if any
    pub fn field_for(&self, header: &str) -> Option<ImportField> {
        self.entries.get(header).copied()
    }

    /// Header assigned to a field, if any
    pub fn header_for(&self, field: ImportField) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, f)| **f == field)
            .map(|(h, _)| h.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ImportField)> {
        self.entries.iter().map(|(h, f)| (h.as_str(), *f))
    }

    /// Serialize to the opaque per-user blob stored in the profile
    pub fn to_saved(&self) -> Result<SerializedMapping> {
        Ok(SerializedMapping(serde_json::to_string(&self.entries)?))
    }

    /// Rebuild a mapping from a persisted blob
    ///
    /// The saved mapping is applied verbatim, whatever the current file's
    /// headers are; a stale entry surfaces later as a missing column at row
    /// time, not here.
    pub fn from_saved(saved: &SerializedMapping) -> Result<Self> {
        let entries: BTreeMap<String, ImportField> = serde_json::from_str(&saved.0)?;
        Ok(Self { entries })
    }
}

/// Opaque serialized form of a [`ColumnMapping`], as persisted per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedMapping(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_steals_tag_from_previous_header() {
        let mut mapping = ColumnMapping::new();
        mapping.assign("Montant", ImportField::Amount);
        mapping.assign("Total TTC", ImportField::Amount);

        assert_eq!(mapping.field_for("Montant"), None);
        assert_eq!(mapping.field_for("Total TTC"), Some(ImportField::Amount));
        assert_eq!(mapping.header_for(ImportField::Amount), Some("Total TTC"));
    }

    #[test]
    fn test_unassign() {
        let mut mapping = ColumnMapping::new();
        mapping.assign("Client", ImportField::Client);
        mapping.unassign("Client");
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_saved_round_trip() {
        let mut mapping = ColumnMapping::new();
        mapping.assign("Facture", ImportField::InvoiceNumber);
        mapping.assign("Montant", ImportField::Amount);

        let saved = mapping.to_saved().unwrap();
        let restored = ColumnMapping::from_saved(&saved).unwrap();

        assert_eq!(restored.field_for("Facture"), Some(ImportField::InvoiceNumber));
        assert_eq!(restored.field_for("Montant"), Some(ImportField::Amount));
    }

    #[test]
    fn test_blob_uses_snake_case_tags() {
        let mut mapping = ColumnMapping::new();
        mapping.assign("Facture", ImportField::InvoiceNumber);
        let saved = mapping.to_saved().unwrap();
        assert!(saved.0.contains("invoice_number"));
    }

    #[test]
    fn test_required_fields_per_kind() {
        assert!(ImportKind::Receivables
            .required_fields()
            .contains(&ImportField::DueDate));
        assert_eq!(
            ImportKind::Clients.required_fields(),
            &[ImportField::CompanyName, ImportField::Email]
        );
    }
}
