//! Auth port - current user lookup

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;

/// The authenticated user all writes are scoped to
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Authentication provider
///
/// Session management itself is out of scope; the core only needs to know
/// who the current user is, and refuses to open an import session without
/// one.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The currently authenticated user, or `None` if signed out
    async fn current_user(&self) -> Result<Option<AuthUser>>;
}
