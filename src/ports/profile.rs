//! Profile store port - per-user persisted settings

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::SerializedMapping;

/// Per-user settings storage
///
/// The only setting the import core manages is the saved column mapping,
/// stored as an opaque blob and reused as the default on later imports.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// The user's saved column mapping, if any
    async fn load_mapping(&self, user_id: Uuid) -> Result<Option<SerializedMapping>>;

    /// Save a column mapping as the user's new default
    async fn save_mapping(&self, user_id: Uuid, mapping: &SerializedMapping) -> Result<()>;
}
