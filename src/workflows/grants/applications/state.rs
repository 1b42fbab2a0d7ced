use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};
use tracing::{debug, info};

use super::domain::{
    ApplicationId, ExpirationType, PendingApplication, SubmittedApplication, UserId,
};
use super::repository::{ApplicationRepository, RepositoryError};
use crate::config::ApplicationConfig;
use crate::workflows::grants::condition::FormData;
use crate::workflows::grants::form::{ApplicationOverview, StepSummary};

/// Source of the current time, injectable for tests and batch replays.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Selector for [`ApplicationStateStore::find_applications_by_expiry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryBucket {
    /// `expires_at <= now`.
    Expired,
    /// `now + from_days < expires_at <= now + to_days`.
    Between { from_days: u32, to_days: u32 },
}

fn days_after(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, RepositoryError> {
    Duration::try_days(i64::from(days))
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or_else(|| RepositoryError::ExpiryOutOfRange(format!("{days} days")))
}

/// External reference returned by the submission sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub id: String,
    pub submission_payload: serde_json::Value,
}

/// Lifecycle of pending and submitted applications over an [`ApplicationRepository`].
pub struct ApplicationStateStore<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    expiry_months: u32,
}

impl<R> ApplicationStateStore<R>
where
    R: ApplicationRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: &ApplicationConfig) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        repository: Arc<R>,
        clock: Arc<dyn Clock>,
        config: &ApplicationConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            expiry_months: config.expiry_months,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Inserts an empty application that expires `expiry_months` from now.
    pub fn create_new_application(
        &self,
        user: &UserId,
        form_id: &str,
    ) -> Result<PendingApplication, RepositoryError> {
        let now = self.now();
        let expires_at = now
            .checked_add_months(Months::new(self.expiry_months))
            .ok_or_else(|| {
                RepositoryError::ExpiryOutOfRange(format!("{} months", self.expiry_months))
            })?;

        let application = self.repository.insert_pending(PendingApplication {
            id: ApplicationId::new(),
            user_id: user.clone(),
            form_id: form_id.to_string(),
            application_data: None,
            submission_attempts: 0,
            expires_at,
            created_at: now,
        })?;

        info!(
            application_id = %application.id,
            user_id = %user,
            form_id,
            expires_at = %application.expires_at,
            "pending application created"
        );
        Ok(application)
    }

    /// The caller's live application. Someone else's, or an expired one, reads as absent.
    pub fn get_application(
        &self,
        id: &ApplicationId,
        user: &UserId,
    ) -> Result<Option<PendingApplication>, RepositoryError> {
        let now = self.now();
        Ok(self
            .repository
            .fetch_pending(id)?
            .filter(|application| &application.user_id == user && !application.is_expired(now)))
    }

    pub fn get_applications_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<PendingApplication>, RepositoryError> {
        let now = self.now();
        Ok(self
            .repository
            .pending_for_user(user)?
            .into_iter()
            .filter(|application| !application.is_expired(now))
            .collect())
    }

    /// Overwrites the stored answers with `snapshot`. Merging with earlier answers is the
    /// caller's job; concurrent saves race and the later one wins.
    pub fn save_application_state(
        &self,
        id: &ApplicationId,
        user: &UserId,
        snapshot: FormData,
    ) -> Result<PendingApplication, RepositoryError> {
        let mut application = self
            .get_application(id, user)?
            .ok_or(RepositoryError::NotFound)?;
        application.application_data = Some(snapshot);
        self.repository.update_pending(application.clone())?;
        debug!(application_id = %id, "application snapshot saved");
        Ok(application)
    }

    pub fn record_submission_attempt(
        &self,
        id: &ApplicationId,
        user: &UserId,
    ) -> Result<u32, RepositoryError> {
        let mut application = self
            .get_application(id, user)?
            .ok_or(RepositoryError::NotFound)?;
        application.submission_attempts += 1;
        let attempts = application.submission_attempts;
        self.repository.update_pending(application)?;
        info!(application_id = %id, attempts, "submission attempt recorded");
        Ok(attempts)
    }

    /// Removes the caller's application. Returns whether anything was deleted.
    pub fn delete_application(
        &self,
        id: &ApplicationId,
        user: &UserId,
    ) -> Result<bool, RepositoryError> {
        match self.repository.fetch_pending(id)? {
            Some(application) if &application.user_id == user => {
                let deleted = self.repository.delete_pending(id)?;
                info!(application_id = %id, "pending application deleted");
                Ok(deleted)
            }
            _ => Ok(false),
        }
    }

    pub(crate) fn reap(&self, id: &ApplicationId) -> Result<bool, RepositoryError> {
        self.repository.delete_pending(id)
    }

    pub fn find_applications_by_expiry(
        &self,
        bucket: ExpiryBucket,
    ) -> Result<Vec<PendingApplication>, RepositoryError> {
        let now = self.now();
        match bucket {
            ExpiryBucket::Expired => self.repository.pending_expiring(None, now),
            ExpiryBucket::Between { from_days, to_days } => {
                let after = days_after(now, from_days)?;
                let until = days_after(now, to_days)?;
                self.repository.pending_expiring(Some(after), until)
            }
        }
    }

    pub fn sent_reminders(
        &self,
        id: &ApplicationId,
    ) -> Result<Vec<ExpirationType>, RepositoryError> {
        self.repository.sent_reminders(id)
    }

    pub fn record_reminder(
        &self,
        id: &ApplicationId,
        expiration: ExpirationType,
    ) -> Result<(), RepositoryError> {
        self.repository.record_reminder(id, expiration)
    }

    /// Writes the immutable submitted record. The pending row is left for the caller to
    /// delete.
    pub fn create_from_pending_application(
        &self,
        pending: &PendingApplication,
        overview: ApplicationOverview,
        summary: Vec<StepSummary>,
        receipt: SubmissionReceipt,
    ) -> Result<SubmittedApplication, RepositoryError> {
        let submitted = self.repository.insert_submitted(SubmittedApplication {
            id: pending.id,
            user_id: pending.user_id.clone(),
            form_id: pending.form_id.clone(),
            application_title: overview.title,
            application_country: overview.country,
            application_overview: overview.overview,
            application_summary: summary,
            external_reference_id: receipt.id,
            external_submission_payload: receipt.submission_payload,
            started_at: pending.created_at,
            submitted_at: self.now(),
        })?;
        info!(
            application_id = %submitted.id,
            external_reference_id = %submitted.external_reference_id,
            "submitted application recorded"
        );
        Ok(submitted)
    }

    pub fn submitted_applications(
        &self,
        user: &UserId,
    ) -> Result<Vec<SubmittedApplication>, RepositoryError> {
        self.repository.submitted_for_user(user)
    }
}
