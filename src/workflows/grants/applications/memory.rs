use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{
    ApplicationExpiration, ApplicationId, ExpirationType, PendingApplication,
    SubmittedApplication, UserId,
};
use super::repository::{ApplicationRepository, RepositoryError};

#[derive(Debug, Default)]
struct Tables {
    pending: HashMap<ApplicationId, PendingApplication>,
    submitted: HashMap<ApplicationId, SubmittedApplication>,
    expirations: HashMap<ApplicationId, ExpirationRow>,
}

#[derive(Debug)]
struct ExpirationRow {
    id: Uuid,
    kinds: BTreeSet<ExpirationType>,
}

impl ExpirationRow {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            kinds: BTreeSet::new(),
        }
    }
}

/// Process-local repository used by the CLI and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryApplicationRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending(applications: impl IntoIterator<Item = PendingApplication>) -> Self {
        let repository = Self::default();
        if let Ok(mut tables) = repository.tables.lock() {
            tables.pending.extend(
                applications
                    .into_iter()
                    .map(|application| (application.id, application)),
            );
        }
        repository
    }

    /// Snapshot of the reminder ledger, ordered by application id.
    pub fn expirations(&self) -> Result<Vec<ApplicationExpiration>, RepositoryError> {
        let tables = self.lock()?;
        let mut rows: Vec<ApplicationExpiration> = tables
            .expirations
            .iter()
            .map(|(application_id, row)| ApplicationExpiration {
                id: row.id,
                application_id: *application_id,
                expiration_types: row.kinds.iter().copied().collect(),
            })
            .collect();
        rows.sort_by_key(|row| row.application_id);
        Ok(rows)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

fn sorted_by_expiry(mut applications: Vec<PendingApplication>) -> Vec<PendingApplication> {
    applications.sort_by_key(|application| (application.expires_at, application.id));
    applications
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert_pending(
        &self,
        application: PendingApplication,
    ) -> Result<PendingApplication, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.pending.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.pending.insert(application.id, application.clone());
        Ok(application)
    }

    fn update_pending(&self, application: PendingApplication) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        match tables.pending.get_mut(&application.id) {
            Some(existing) => {
                *existing = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_pending(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<PendingApplication>, RepositoryError> {
        Ok(self.lock()?.pending.get(id).cloned())
    }

    fn pending_for_user(&self, user: &UserId) -> Result<Vec<PendingApplication>, RepositoryError> {
        let tables = self.lock()?;
        Ok(sorted_by_expiry(
            tables
                .pending
                .values()
                .filter(|application| &application.user_id == user)
                .cloned()
                .collect(),
        ))
    }

    fn pending_expiring(
        &self,
        after: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> Result<Vec<PendingApplication>, RepositoryError> {
        let tables = self.lock()?;
        Ok(sorted_by_expiry(
            tables
                .pending
                .values()
                .filter(|application| {
                    application.expires_at <= until
                        && after.is_none_or(|after| application.expires_at > after)
                })
                .cloned()
                .collect(),
        ))
    }

    fn delete_pending(&self, id: &ApplicationId) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;
        tables.expirations.remove(id);
        Ok(tables.pending.remove(id).is_some())
    }

    fn insert_submitted(
        &self,
        application: SubmittedApplication,
    ) -> Result<SubmittedApplication, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.submitted.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.submitted.insert(application.id, application.clone());
        Ok(application)
    }

    fn submitted_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<SubmittedApplication>, RepositoryError> {
        let tables = self.lock()?;
        let mut applications: Vec<SubmittedApplication> = tables
            .submitted
            .values()
            .filter(|application| &application.user_id == user)
            .cloned()
            .collect();
        applications.sort_by_key(|application| application.submitted_at);
        Ok(applications)
    }

    fn sent_reminders(&self, id: &ApplicationId) -> Result<Vec<ExpirationType>, RepositoryError> {
        Ok(self
            .lock()?
            .expirations
            .get(id)
            .map(|row| row.kinds.iter().copied().collect())
            .unwrap_or_default())
    }

    fn record_reminder(
        &self,
        id: &ApplicationId,
        expiration: ExpirationType,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.pending.contains_key(id) {
            return Err(RepositoryError::NotFound);
        }
        tables
            .expirations
            .entry(*id)
            .or_insert_with(ExpirationRow::new)
            .kinds
            .insert(expiration);
        Ok(())
    }
}
