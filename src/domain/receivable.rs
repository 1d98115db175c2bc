//! Receivable domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An outstanding invoice owed by a client, tracked through the
/// payment/reminder lifecycle
///
/// `(owner_id, invoice_number)` is the natural key: re-importing the same
/// invoice number updates the existing row instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receivable {
    pub id: Uuid,
    pub client_id: Uuid,
    pub invoice_number: String,
    pub amount: Decimal,
    pub paid_amount: Option<Decimal>,
    pub document_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    /// Opaque installment label, e.g. "2/4"
    pub installment_number: Option<String>,
    /// Opaque management reference carried through from the source file
    pub management_number: Option<String>,
    pub code: Option<String>,
    pub status: ReceivableStatus,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receivable {
    /// Create a new receivable with required fields
    pub fn new(
        id: Uuid,
        owner_id: Uuid,
        client_id: Uuid,
        invoice_number: impl Into<String>,
        amount: Decimal,
        due_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            client_id,
            invoice_number: invoice_number.into(),
            amount,
            paid_amount: None,
            document_date: None,
            due_date,
            installment_number: None,
            management_number: None,
            code: None,
            status: ReceivableStatus::Pending,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when this row can enter the commit batch: a resolved client,
    /// a non-empty invoice number and a strictly positive amount.
    pub fn is_importable(&self) -> bool {
        !self.invoice_number.trim().is_empty() && self.amount > Decimal::ZERO
    }
}

/// Receivable lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivableStatus {
    Pending,
    Reminded,
    Paid,
    Late,
    Legal,
}

impl Default for ReceivableStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Keyword synonyms checked by `infer`, bucket order matters: the first
/// bucket containing a substring of the input wins.
const PAID_KEYWORDS: &[&str] = &["payé", "paye", "paid", "réglé", "regle", "soldé", "solde"];
const REMINDED_KEYWORDS: &[&str] = &["relance", "relancé", "rappel", "remind"];
const LATE_KEYWORDS: &[&str] = &["retard", "late", "overdue", "échu", "echu"];
const LEGAL_KEYWORDS: &[&str] = &["contentieux", "juridique", "legal", "mise en demeure", "huissier"];

impl ReceivableStatus {
    /// Infer a status from free text, case-insensitive substring match
    ///
    /// Unmatched text (including the empty string) is `Pending`.
    pub fn infer(raw: &str) -> Self {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return Self::Pending;
        }
        let buckets: [(&[&str], Self); 4] = [
            (PAID_KEYWORDS, Self::Paid),
            (REMINDED_KEYWORDS, Self::Reminded),
            (LATE_KEYWORDS, Self::Late),
            (LEGAL_KEYWORDS, Self::Legal),
        ];
        for (keywords, status) in buckets {
            if keywords.iter().any(|k| text.contains(k)) {
                return status;
            }
        }
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_receivable(invoice: &str, amount: Decimal) -> Receivable {
        Receivable::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            invoice,
            amount,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        )
    }

    #[test]
    fn test_importable_predicate() {
        assert!(test_receivable("F-2024-001", Decimal::new(10000, 2)).is_importable());
        assert!(!test_receivable("", Decimal::new(10000, 2)).is_importable());
        assert!(!test_receivable("   ", Decimal::new(10000, 2)).is_importable());
        assert!(!test_receivable("F-2024-001", Decimal::ZERO).is_importable());
        assert!(!test_receivable("F-2024-001", Decimal::new(-500, 2)).is_importable());
    }

    #[test]
    fn test_status_inference_buckets() {
        assert_eq!(ReceivableStatus::infer("Payé le 12/02"), ReceivableStatus::Paid);
        assert_eq!(ReceivableStatus::infer("PAID"), ReceivableStatus::Paid);
        assert_eq!(ReceivableStatus::infer("Relance 2"), ReceivableStatus::Reminded);
        assert_eq!(ReceivableStatus::infer("en retard"), ReceivableStatus::Late);
        assert_eq!(ReceivableStatus::infer("dossier contentieux"), ReceivableStatus::Legal);
        assert_eq!(ReceivableStatus::infer("en cours"), ReceivableStatus::Pending);
        assert_eq!(ReceivableStatus::infer(""), ReceivableStatus::Pending);
    }

    #[test]
    fn test_status_inference_first_bucket_wins() {
        // "relance" and "retard" both present: the reminded bucket is
        // checked before the late bucket, paid before everything.
        assert_eq!(
            ReceivableStatus::infer("relance apres retard"),
            ReceivableStatus::Reminded
        );
        assert_eq!(
            ReceivableStatus::infer("réglé après relance"),
            ReceivableStatus::Paid
        );
    }
}
