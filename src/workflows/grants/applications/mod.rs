//! Pending and submitted application persistence, the expiry sweep, and the service that
//! ties a form definition to stored answers.

pub mod domain;
pub mod expiry;
pub mod memory;
pub mod repository;
pub mod service;
pub mod state;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationExpiration, ApplicationId, ExpirationType, PendingApplication, ReminderSchedule,
    SubmittedApplication, UserId,
};
pub use expiry::{ExpiryReminder, ExpirySweep, ReminderError, ReminderSender, SweepReport};
pub use memory::InMemoryApplicationRepository;
pub use repository::{ApplicationRepository, RepositoryError};
pub use service::{
    ApplicationServiceError, GrantApplicationService, OutboundSubmission, Resume, StepSave,
    SubmissionError, SubmissionSink, SubmitOutcome,
};
pub use state::{
    ApplicationStateStore, Clock, ExpiryBucket, FixedClock, SubmissionReceipt, SystemClock,
};
