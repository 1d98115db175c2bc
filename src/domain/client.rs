//! Client domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of reminder escalation levels
pub const REMINDER_LEVELS: usize = 4;

/// Default delay thresholds in days for the four escalation levels
pub const DEFAULT_REMINDER_DELAYS: [u32; REMINDER_LEVELS] = [7, 15, 30, 45];

/// A client (debtor company) owned by one user of the tool
///
/// `company_name` is the primary matching key during CSV import. It does not
/// have to be unique; the resolver treats an exact case-insensitive match as
/// authoritative and falls back to fuzzier strategies from there.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub company_name: String,
    pub email: String,
    /// Escalating delay thresholds in days, one per reminder level
    pub reminder_delays: [u32; REMINDER_LEVELS],
    /// Message template per reminder level
    pub reminder_templates: [String; REMINDER_LEVELS],
    /// Sender profile used for outbound reminders
    pub profile_id: Option<Uuid>,
    /// True when an unpaid receivable is attached and a reminder is pending
    pub needs_reminder: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Create a new client with default reminder configuration
    pub fn new(id: Uuid, owner_id: Uuid, company_name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            company_name: company_name.into(),
            email: email.into(),
            reminder_delays: DEFAULT_REMINDER_DELAYS,
            reminder_templates: Default::default(),
            profile_id: None,
            needs_reminder: false,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Synthesize a placeholder client for a CSV name with no roster match
    ///
    /// The placeholder carries a derived email (lowercased name, spaces
    /// replaced by dots) and is flagged for reminders immediately. Its id is
    /// temporary: the import commit rewrites it to the real id once the
    /// client row is persisted.
    pub fn placeholder(owner_id: Uuid, raw_name: &str) -> Self {
        let name = raw_name.trim();
        let derived_email = format!(
            "{}@example.com",
            name.to_lowercase().split_whitespace().collect::<Vec<_>>().join(".")
        );
        let mut client = Self::new(Uuid::new_v4(), owner_id, name, derived_email);
        client.needs_reminder = true;
        client
    }

    /// Select the reminder escalation level for a receivable overdue by
    /// `days_overdue` days, against this client's delay thresholds.
    ///
    /// Returns `None` while the first threshold has not been reached.
    pub fn reminder_level(&self, days_overdue: i64) -> Option<ReminderLevel> {
        if days_overdue < 0 {
            return None;
        }
        let mut level = None;
        for (i, delay) in self.reminder_delays.iter().enumerate() {
            if days_overdue >= *delay as i64 {
                level = ReminderLevel::from_index(i);
            }
        }
        level
    }

    /// Validate client data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.company_name.trim().is_empty() {
            return Err("company name cannot be empty");
        }
        if self.email.trim().is_empty() {
            return Err("email cannot be empty");
        }
        Ok(())
    }
}

/// Reminder escalation level, chosen by days-overdue against per-client
/// thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderLevel {
    First,
    Second,
    Third,
    Final,
}

impl ReminderLevel {
    fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::First),
            1 => Some(Self::Second),
            2 => Some(Self::Third),
            3 => Some(Self::Final),
            _ => None,
        }
    }

    /// Zero-based index into the per-client delay/template arrays
    pub fn index(&self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
            Self::Final => 3,
        }
    }

    /// Display stage label as shown on receivable lists
    pub fn stage_label(&self) -> &'static str {
        match self {
            Self::First => "Relance 1",
            Self::Second => "Relance 2",
            Self::Third => "Relance 3",
            Self::Final => "Mise en demeure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> Client {
        Client::new(Uuid::new_v4(), Uuid::new_v4(), "Acme", "billing@acme.example")
    }

    #[test]
    fn test_placeholder_email_derivation() {
        let client = Client::placeholder(Uuid::new_v4(), "  Durand et Fils  ");
        assert_eq!(client.company_name, "Durand et Fils");
        assert_eq!(client.email, "durand.et.fils@example.com");
        assert!(client.needs_reminder);
    }

    #[test]
    fn test_reminder_level_thresholds() {
        let client = test_client();
        // defaults: 7 / 15 / 30 / 45 days
        assert_eq!(client.reminder_level(0), None);
        assert_eq!(client.reminder_level(6), None);
        assert_eq!(client.reminder_level(7), Some(ReminderLevel::First));
        assert_eq!(client.reminder_level(20), Some(ReminderLevel::Second));
        assert_eq!(client.reminder_level(30), Some(ReminderLevel::Third));
        assert_eq!(client.reminder_level(100), Some(ReminderLevel::Final));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(ReminderLevel::First.stage_label(), "Relance 1");
        assert_eq!(ReminderLevel::Final.stage_label(), "Mise en demeure");
    }

    #[test]
    fn test_client_validation() {
        let mut client = test_client();
        assert!(client.validate().is_ok());

        client.company_name = "  ".to_string();
        assert!(client.validate().is_err());
    }
}
