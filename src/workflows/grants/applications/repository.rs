use chrono::{DateTime, Utc};

use super::domain::{
    ApplicationId, ExpirationType, PendingApplication, SubmittedApplication, UserId,
};

/// Storage abstraction so the state store can be exercised in isolation. Saves are whole
/// snapshot overwrites; there is no concurrency token, so the later write wins.
pub trait ApplicationRepository: Send + Sync {
    fn insert_pending(
        &self,
        application: PendingApplication,
    ) -> Result<PendingApplication, RepositoryError>;
    fn update_pending(&self, application: PendingApplication) -> Result<(), RepositoryError>;
    fn fetch_pending(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<PendingApplication>, RepositoryError>;
    fn pending_for_user(&self, user: &UserId) -> Result<Vec<PendingApplication>, RepositoryError>;
    /// Pending applications with `after < expires_at <= until`; no lower bound when `after`
    /// is `None`.
    fn pending_expiring(
        &self,
        after: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> Result<Vec<PendingApplication>, RepositoryError>;
    /// Removes the application and its reminder ledger. Returns whether a row existed.
    fn delete_pending(&self, id: &ApplicationId) -> Result<bool, RepositoryError>;

    fn insert_submitted(
        &self,
        application: SubmittedApplication,
    ) -> Result<SubmittedApplication, RepositoryError>;
    fn submitted_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<SubmittedApplication>, RepositoryError>;

    fn sent_reminders(&self, id: &ApplicationId) -> Result<Vec<ExpirationType>, RepositoryError>;
    fn record_reminder(
        &self,
        id: &ApplicationId,
        expiration: ExpirationType,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
    #[error("configured expiry is out of range: {0}")]
    ExpiryOutOfRange(String),
}
