//! Row transformation - mapped CSV rows to domain records

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Client, ColumnMapping, ImportField, Receivable, ReceivableStatus};
use crate::services::normalize::{parse_flexible_amount, parse_flexible_date};

/// Resolved column positions for one file
///
/// Built once per import from the header row and the active mapping. A
/// mapping entry whose header does not exist in this file simply yields no
/// position - that is where a stale saved mapping surfaces, as "no column
/// found" at row time rather than as a mapping-stage error.
#[derive(Debug, Default)]
pub struct FieldIndex {
    positions: HashMap<ImportField, usize>,
}

impl FieldIndex {
    pub fn build(headers: &[String], mapping: &ColumnMapping) -> Self {
        let mut positions = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(field) = mapping.field_for(header) {
                positions.entry(field).or_insert(i);
            }
        }
        Self { positions }
    }

    /// Raw cell value for a field, if the column exists in this file
    pub fn value<'r>(&self, field: ImportField, row: &'r [String]) -> Option<&'r str> {
        self.positions
            .get(&field)
            .and_then(|i| row.get(*i))
            .map(|s| s.as_str())
    }

    /// Trimmed, non-empty cell value for a field
    pub fn text(&self, field: ImportField, row: &[String]) -> Option<String> {
        self.value(field, row)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Transform a mapped row into a receivable attached to a resolved client
///
/// Lenient by design: an unparsable amount becomes 0, an unparsable date
/// falls back to `today`. The caller filters the result through
/// [`Receivable::is_importable`] instead of treating bad cells as errors.
pub fn transform_receivable(
    row: &[String],
    index: &FieldIndex,
    owner_id: Uuid,
    client_id: Uuid,
    today: NaiveDate,
) -> Receivable {
    let invoice_number = index
        .text(ImportField::InvoiceNumber, row)
        .unwrap_or_default();
    let amount = parse_flexible_amount(index.value(ImportField::Amount, row).unwrap_or(""));
    let due_date = index
        .value(ImportField::DueDate, row)
        .and_then(parse_flexible_date)
        .unwrap_or(today);

    let mut receivable = Receivable::new(
        Uuid::new_v4(),
        owner_id,
        client_id,
        invoice_number,
        amount,
        due_date,
    );

    receivable.paid_amount = index
        .value(ImportField::PaidAmount, row)
        .map(parse_flexible_amount);
    receivable.document_date = index
        .value(ImportField::DocumentDate, row)
        .map(|raw| parse_flexible_date(raw).unwrap_or(today));
    receivable.installment_number = index.text(ImportField::InstallmentNumber, row);
    receivable.management_number = index.text(ImportField::ManagementNumber, row);
    receivable.code = index.text(ImportField::Code, row);
    receivable.status = index
        .value(ImportField::Status, row)
        .map(ReceivableStatus::infer)
        .unwrap_or_default();

    receivable
}

/// Transform a mapped row into a client record (client imports)
///
/// Returns `None` for rows missing a company name or email; such rows are
/// dropped from the commit batch, mirroring the receivable path.
pub fn transform_client(row: &[String], index: &FieldIndex, owner_id: Uuid) -> Option<Client> {
    let company_name = index.text(ImportField::CompanyName, row)?;
    let email = index.text(ImportField::Email, row)?;
    Some(Client::new(Uuid::new_v4(), owner_id, company_name, email))
}
