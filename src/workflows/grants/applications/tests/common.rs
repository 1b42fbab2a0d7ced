use std::sync::{Arc, Mutex};

use chrono::{DateTime, Months, TimeZone, Utc};
use serde_json::{json, Value};

use crate::config::ApplicationConfig;
use crate::workflows::grants::applications::{
    ApplicationId, ApplicationRepository, ApplicationStateStore, ExpirationType,
    ExpiryReminder, FixedClock, GrantApplicationService, InMemoryApplicationRepository,
    OutboundSubmission, PendingApplication, ReminderError, ReminderSender, RepositoryError,
    SubmissionError, SubmissionReceipt, SubmissionSink, SubmittedApplication, UserId,
};
use crate::workflows::grants::condition::{Condition, FormData};
use crate::workflows::grants::fields::{FieldDefinition, FieldKind, FieldOption};
use crate::workflows::grants::form::{FormModel, OverviewSpec};
use crate::workflows::grants::steps::{SectionDefinition, StepDefinition};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .expect("valid time")
}

pub(super) fn months_later(months: u32) -> DateTime<Utc> {
    now()
        .checked_add_months(Months::new(months))
        .expect("valid time")
}

pub(super) fn user() -> UserId {
    UserId("user-1".to_string())
}

pub(super) fn data(value: Value) -> FormData {
    value.as_object().cloned().unwrap_or_default()
}

pub(super) fn store_at(
    repository: Arc<InMemoryApplicationRepository>,
    at: DateTime<Utc>,
) -> Arc<ApplicationStateStore<InMemoryApplicationRepository>> {
    Arc::new(ApplicationStateStore::with_clock(
        repository,
        Arc::new(FixedClock(at)),
        &ApplicationConfig::default(),
    ))
}

pub(super) fn pending(expires_at: DateTime<Utc>) -> PendingApplication {
    PendingApplication {
        id: ApplicationId::new(),
        user_id: user(),
        form_id: "community-project".to_string(),
        application_data: None,
        submission_attempts: 0,
        expires_at,
        created_at: now(),
    }
}

/// Project[Name, Country] then Contacts[SeniorContact, WelshContact (Wales only)].
pub(super) fn project_form() -> FormModel {
    FormModel::builder("community-project", "Community project")
        .section(
            SectionDefinition::new("your-project", "Your project")
                .step(
                    StepDefinition::new("Project name").field(
                        FieldDefinition::builder(
                            "projectName",
                            FieldKind::Text {
                                max_length: Some(80),
                            },
                        )
                        .label("Project name")
                        .build(),
                    ),
                )
                .step(
                    StepDefinition::new("Project country").field(
                        FieldDefinition::builder("projectCountry", FieldKind::Radio)
                            .label("Country")
                            .option(FieldOption::new("england", "England"))
                            .option(FieldOption::new("wales", "Wales"))
                            .build(),
                    ),
                ),
        )
        .section(
            SectionDefinition::new("contacts", "Contacts")
                .step(
                    StepDefinition::new("Senior contact").field(
                        FieldDefinition::builder("seniorContactEmail", FieldKind::Email)
                            .label("Senior contact email")
                            .build(),
                    ),
                )
                .step(
                    StepDefinition::new("Welsh contact")
                        .field(
                            FieldDefinition::builder("welshContactEmail", FieldKind::Email)
                                .label("Welsh contact email")
                                .build(),
                        )
                        .when(Condition::field_equals("projectCountry", "wales")),
                ),
        )
        .overview(OverviewSpec {
            title_field: "projectName".to_string(),
            country_field: Some("projectCountry".to_string()),
            overview_fields: Vec::new(),
        })
        .build()
        .expect("valid form")
}

pub(super) fn complete_answers() -> FormData {
    data(json!({
        "projectName": "Community garden",
        "projectCountry": "england",
        "seniorContactEmail": "chair@example.com"
    }))
}

pub(super) fn build_service() -> (
    GrantApplicationService<InMemoryApplicationRepository, MemorySink>,
    Arc<InMemoryApplicationRepository>,
    Arc<MemorySink>,
) {
    let repository = Arc::new(InMemoryApplicationRepository::new());
    let sink = Arc::new(MemorySink::default());
    let service = GrantApplicationService::new(
        Arc::new(project_form()),
        store_at(repository.clone(), now()),
        sink.clone(),
    );
    (service, repository, sink)
}

#[derive(Default)]
pub(super) struct MemorySink {
    submissions: Mutex<Vec<OutboundSubmission>>,
}

impl MemorySink {
    pub(super) fn submissions(&self) -> Vec<OutboundSubmission> {
        self.submissions
            .lock()
            .expect("sink mutex poisoned")
            .clone()
    }
}

impl SubmissionSink for MemorySink {
    fn submit(
        &self,
        submission: &OutboundSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let mut guard = self.submissions.lock().expect("sink mutex poisoned");
        guard.push(submission.clone());
        Ok(SubmissionReceipt {
            id: format!("crm-{:04}", guard.len()),
            submission_payload: json!({
                "application": submission.application_id,
                "answers": submission.answers,
            }),
        })
    }
}

pub(super) struct UnavailableSink;

impl SubmissionSink for UnavailableSink {
    fn submit(
        &self,
        _submission: &OutboundSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        Err(SubmissionError::Unavailable("crm offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryReminders {
    sent: Mutex<Vec<ExpiryReminder>>,
    failing: Mutex<bool>,
}

impl MemoryReminders {
    pub(super) fn sent(&self) -> Vec<ExpiryReminder> {
        self.sent.lock().expect("reminder mutex poisoned").clone()
    }

    pub(super) fn set_failing(&self, failing: bool) {
        *self.failing.lock().expect("reminder mutex poisoned") = failing;
    }

    pub(super) fn kinds(&self) -> Vec<ExpirationType> {
        self.sent()
            .into_iter()
            .map(|reminder| reminder.expiration_type)
            .collect()
    }
}

impl ReminderSender for MemoryReminders {
    fn send(&self, reminder: &ExpiryReminder) -> Result<(), ReminderError> {
        if *self.failing.lock().expect("reminder mutex poisoned") {
            return Err(ReminderError::Transport("smtp timeout".to_string()));
        }
        self.sent
            .lock()
            .expect("reminder mutex poisoned")
            .push(reminder.clone());
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert_pending(
        &self,
        _application: PendingApplication,
    ) -> Result<PendingApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_pending(&self, _application: PendingApplication) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_pending(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<PendingApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending_for_user(&self, _user: &UserId) -> Result<Vec<PendingApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending_expiring(
        &self,
        _after: Option<DateTime<Utc>>,
        _until: DateTime<Utc>,
    ) -> Result<Vec<PendingApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_pending(&self, _id: &ApplicationId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_submitted(
        &self,
        _application: SubmittedApplication,
    ) -> Result<SubmittedApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn submitted_for_user(
        &self,
        _user: &UserId,
    ) -> Result<Vec<SubmittedApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn sent_reminders(&self, _id: &ApplicationId) -> Result<Vec<ExpirationType>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_reminder(
        &self,
        _id: &ApplicationId,
        _expiration: ExpirationType,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
