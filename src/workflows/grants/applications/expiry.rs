use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ApplicationId, ExpirationType, ReminderSchedule, UserId};
use super::repository::{ApplicationRepository, RepositoryError};
use super::state::{ApplicationStateStore, ExpiryBucket};

/// Message handed to the outbound mail sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryReminder {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub form_id: String,
    pub expiration_type: ExpirationType,
    pub expires_at: DateTime<Utc>,
}

pub trait ReminderSender: Send + Sync {
    fn send(&self, reminder: &ExpiryReminder) -> Result<(), ReminderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub reminders_sent: usize,
    pub reminders_skipped: usize,
    pub reminders_failed: usize,
    pub expired_deleted: usize,
}

/// Batch job that reminds applicants before their application expires and deletes expired
/// ones. The reminder ledger makes repeated runs safe: a reminder is recorded only after it
/// is sent, so failures are retried by the next run.
pub struct ExpirySweep<R, S> {
    store: Arc<ApplicationStateStore<R>>,
    sender: Arc<S>,
    schedule: ReminderSchedule,
}

impl<R, S> ExpirySweep<R, S>
where
    R: ApplicationRepository + 'static,
    S: ReminderSender + 'static,
{
    pub fn new(
        store: Arc<ApplicationStateStore<R>>,
        sender: Arc<S>,
        schedule: ReminderSchedule,
    ) -> Self {
        Self {
            store,
            sender,
            schedule,
        }
    }

    pub fn run(&self) -> Result<SweepReport, RepositoryError> {
        let mut report = SweepReport::default();

        for (expiration, from_days, to_days) in self.schedule.windows() {
            let due = self
                .store
                .find_applications_by_expiry(ExpiryBucket::Between { from_days, to_days })?;

            for application in due {
                let sent = self.store.sent_reminders(&application.id)?;
                if sent.contains(&expiration) {
                    report.reminders_skipped += 1;
                    continue;
                }

                let reminder = ExpiryReminder {
                    application_id: application.id,
                    user_id: application.user_id.clone(),
                    form_id: application.form_id.clone(),
                    expiration_type: expiration,
                    expires_at: application.expires_at,
                };

                match self.sender.send(&reminder) {
                    Ok(()) => {
                        self.store.record_reminder(&application.id, expiration)?;
                        report.reminders_sent += 1;
                        info!(
                            application_id = %application.id,
                            expiration = expiration.label(),
                            "expiry reminder sent"
                        );
                    }
                    Err(err) => {
                        report.reminders_failed += 1;
                        warn!(
                            application_id = %application.id,
                            expiration = expiration.label(),
                            error = %err,
                            "expiry reminder failed; will retry next run"
                        );
                    }
                }
            }
        }

        for application in self.store.find_applications_by_expiry(ExpiryBucket::Expired)? {
            if self.store.reap(&application.id)? {
                report.expired_deleted += 1;
                info!(application_id = %application.id, "expired application deleted");
            }
        }

        info!(
            sent = report.reminders_sent,
            skipped = report.reminders_skipped,
            failed = report.reminders_failed,
            deleted = report.expired_deleted,
            "expiry sweep finished"
        );
        Ok(report)
    }
}
