//! Header reconciliation - mapping raw CSV headers to canonical field tags

use tracing::warn;

use crate::domain::{ColumnMapping, ImportField, ImportKind, SerializedMapping};

/// Alias table for receivable imports, keyed by normalized header
///
/// Lookup is an exact match on the lowercased, trimmed header. Headers with
/// no alias stay unmapped ("do not import").
const RECEIVABLE_ALIASES: &[(&str, ImportField)] = &[
    ("client", ImportField::Client),
    ("clients", ImportField::Client),
    ("nom", ImportField::Client),
    ("nom client", ImportField::Client),
    ("société", ImportField::Client),
    ("societe", ImportField::Client),
    ("raison sociale", ImportField::Client),
    ("company", ImportField::Client),
    ("customer", ImportField::Client),
    ("tiers", ImportField::Client),
    ("facture", ImportField::InvoiceNumber),
    ("n° facture", ImportField::InvoiceNumber),
    ("no facture", ImportField::InvoiceNumber),
    ("num facture", ImportField::InvoiceNumber),
    ("numéro de facture", ImportField::InvoiceNumber),
    ("numero de facture", ImportField::InvoiceNumber),
    ("n° de facture", ImportField::InvoiceNumber),
    ("invoice", ImportField::InvoiceNumber),
    ("invoice number", ImportField::InvoiceNumber),
    ("référence", ImportField::InvoiceNumber),
    ("reference", ImportField::InvoiceNumber),
    ("montant", ImportField::Amount),
    ("montant ttc", ImportField::Amount),
    ("total", ImportField::Amount),
    ("total ttc", ImportField::Amount),
    ("amount", ImportField::Amount),
    ("price", ImportField::Amount),
    ("prix", ImportField::Amount),
    ("montant réglé", ImportField::PaidAmount),
    ("montant regle", ImportField::PaidAmount),
    ("réglé", ImportField::PaidAmount),
    ("regle", ImportField::PaidAmount),
    ("montant payé", ImportField::PaidAmount),
    ("montant paye", ImportField::PaidAmount),
    ("paid", ImportField::PaidAmount),
    ("paid amount", ImportField::PaidAmount),
    ("date d'échéance", ImportField::DueDate),
    ("date d'echeance", ImportField::DueDate),
    ("échéance", ImportField::DueDate),
    ("echeance", ImportField::DueDate),
    ("due date", ImportField::DueDate),
    ("date limite", ImportField::DueDate),
    ("date limite de paiement", ImportField::DueDate),
    ("statut", ImportField::Status),
    ("status", ImportField::Status),
    ("état", ImportField::Status),
    ("etat", ImportField::Status),
    ("date", ImportField::DocumentDate),
    ("date facture", ImportField::DocumentDate),
    ("date de facture", ImportField::DocumentDate),
    ("date du document", ImportField::DocumentDate),
    ("document date", ImportField::DocumentDate),
    ("date émission", ImportField::DocumentDate),
    ("date emission", ImportField::DocumentDate),
    ("n° échéance", ImportField::InstallmentNumber),
    ("echeance n°", ImportField::InstallmentNumber),
    ("versement", ImportField::InstallmentNumber),
    ("installment", ImportField::InstallmentNumber),
    ("n° gestion", ImportField::ManagementNumber),
    ("no gestion", ImportField::ManagementNumber),
    ("numéro de gestion", ImportField::ManagementNumber),
    ("numero de gestion", ImportField::ManagementNumber),
    ("gestion", ImportField::ManagementNumber),
    ("dossier", ImportField::ManagementNumber),
    ("management number", ImportField::ManagementNumber),
    ("code", ImportField::Code),
    ("code client", ImportField::Code),
];

/// Alias table for the simpler client import
const CLIENT_ALIASES: &[(&str, ImportField)] = &[
    ("société", ImportField::CompanyName),
    ("societe", ImportField::CompanyName),
    ("nom", ImportField::CompanyName),
    ("nom de la société", ImportField::CompanyName),
    ("nom de la societe", ImportField::CompanyName),
    ("raison sociale", ImportField::CompanyName),
    ("client", ImportField::CompanyName),
    ("company", ImportField::CompanyName),
    ("company name", ImportField::CompanyName),
    ("email", ImportField::Email),
    ("e-mail", ImportField::Email),
    ("mail", ImportField::Email),
    ("courriel", ImportField::Email),
    ("adresse email", ImportField::Email),
    ("adresse e-mail", ImportField::Email),
];

fn alias_table(kind: ImportKind) -> &'static [(&'static str, ImportField)] {
    match kind {
        ImportKind::Receivables => RECEIVABLE_ALIASES,
        ImportKind::Clients => CLIENT_ALIASES,
    }
}

/// Build the column mapping for a freshly uploaded file
///
/// A previously saved mapping is applied verbatim, whatever the file's
/// headers actually are: the user's configuration is trusted, and a stale
/// entry surfaces later as a missing column at row-processing time. Without
/// one, each normalized header is looked up in the static alias table; the
/// first header claiming a field keeps it.
pub fn reconcile(
    kind: ImportKind,
    headers: &[String],
    saved: Option<&SerializedMapping>,
) -> ColumnMapping {
    if let Some(saved) = saved {
        match ColumnMapping::from_saved(saved) {
            Ok(mapping) => return mapping,
            Err(err) => {
                warn!("saved mapping is unreadable, falling back to alias detection: {err}");
            }
        }
    }

    let table = alias_table(kind);
    let mut mapping = ColumnMapping::new();
    for header in headers {
        let normalized = header.trim().to_lowercase();
        if let Some((_, field)) = table.iter().find(|(alias, _)| *alias == normalized) {
            if mapping.header_for(*field).is_none() {
                mapping.assign(header.clone(), *field);
            }
        }
    }
    mapping
}

/// Required field tags that have no header assigned yet
///
/// A non-empty result blocks progression past the mapping stage; the tags
/// are returned as display labels for the error message.
pub fn missing_required(kind: ImportKind, mapping: &ColumnMapping) -> Vec<String> {
    kind.required_fields()
        .iter()
        .filter(|field| mapping.header_for(**field).is_none())
        .map(|field| field.tag().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_aliases_match_regardless_of_case_and_whitespace() {
        let headers = headers(&["  FACTURE ", "Montant", "date d'échéance", "CLIENT"]);
        let mapping = reconcile(ImportKind::Receivables, &headers, None);

        assert_eq!(mapping.field_for("  FACTURE "), Some(ImportField::InvoiceNumber));
        assert_eq!(mapping.field_for("Montant"), Some(ImportField::Amount));
        assert_eq!(mapping.field_for("date d'échéance"), Some(ImportField::DueDate));
        assert_eq!(mapping.field_for("CLIENT"), Some(ImportField::Client));
    }

    #[test]
    fn test_unknown_headers_stay_unmapped() {
        let headers = headers(&["Facture", "Couleur préférée"]);
        let mapping = reconcile(ImportKind::Receivables, &headers, None);
        assert_eq!(mapping.field_for("Couleur préférée"), None);
    }

    #[test]
    fn test_first_header_claiming_a_field_keeps_it() {
        let headers = headers(&["Montant", "Total"]);
        let mapping = reconcile(ImportKind::Receivables, &headers, None);
        assert_eq!(mapping.field_for("Montant"), Some(ImportField::Amount));
        assert_eq!(mapping.field_for("Total"), None);
    }

    #[test]
    fn test_saved_mapping_wins_over_file_headers() {
        let mut saved = ColumnMapping::new();
        saved.assign("Colonne A", ImportField::InvoiceNumber);
        let blob = saved.to_saved().unwrap();

        // The file has perfectly matchable headers, but the saved mapping
        // is applied verbatim.
        let headers = headers(&["Facture", "Montant"]);
        let mapping = reconcile(ImportKind::Receivables, &headers, Some(&blob));

        assert_eq!(mapping.field_for("Colonne A"), Some(ImportField::InvoiceNumber));
        assert_eq!(mapping.field_for("Facture"), None);
        assert_eq!(mapping.field_for("Montant"), None);
    }

    #[test]
    fn test_corrupt_saved_mapping_falls_back_to_aliases() {
        let blob = SerializedMapping("not json".to_string());
        let headers = headers(&["Facture"]);
        let mapping = reconcile(ImportKind::Receivables, &headers, Some(&blob));
        assert_eq!(mapping.field_for("Facture"), Some(ImportField::InvoiceNumber));
    }

    #[test]
    fn test_missing_required_lists_unassigned_tags() {
        let headers = headers(&["Facture", "Montant"]);
        let mapping = reconcile(ImportKind::Receivables, &headers, None);
        let missing = missing_required(ImportKind::Receivables, &mapping);
        assert_eq!(missing, vec!["client".to_string(), "due_date".to_string()]);
    }

    #[test]
    fn test_client_import_aliases() {
        let headers = headers(&["Société", "E-mail"]);
        let mapping = reconcile(ImportKind::Clients, &headers, None);
        assert_eq!(mapping.field_for("Société"), Some(ImportField::CompanyName));
        assert_eq!(mapping.field_for("E-mail"), Some(ImportField::Email));
        assert!(missing_required(ImportKind::Clients, &mapping).is_empty());
    }
}
