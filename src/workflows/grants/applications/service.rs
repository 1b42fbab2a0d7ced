use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ApplicationId, PendingApplication, SubmittedApplication, UserId};
use super::repository::{ApplicationRepository, RepositoryError};
use super::state::{ApplicationStateStore, SubmissionReceipt};
use crate::workflows::grants::condition::FormData;
use crate::workflows::grants::form::{FormModel, StepSummary};
use crate::workflows::grants::locale::Locale;
use crate::workflows::grants::navigation::{
    Destination, NavigationError, NavigationResolver, StepOutcome,
};
use crate::workflows::grants::rules::{AddressLookup, ValidationContext};
use crate::workflows::grants::steps::ValidationReport;

/// Payload handed to the external CRM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundSubmission {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub form_id: String,
    pub locale: Locale,
    pub answers: FormData,
    pub summary: Vec<StepSummary>,
}

/// External submission sink returning `{id, submission_payload}`.
pub trait SubmissionSink: Send + Sync {
    fn submit(&self, submission: &OutboundSubmission) -> Result<SubmissionReceipt, SubmissionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("submission sink unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resume {
    Continue {
        application: PendingApplication,
        destination: Destination,
    },
    /// Missing or expired state sends the applicant back to the start.
    Redirect(Destination),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepSave {
    Saved {
        application: PendingApplication,
        outcome: StepOutcome,
    },
    Redirect(Destination),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(SubmittedApplication),
    Invalid(ValidationReport),
    Redirect(Destination),
}

/// Service composing one form definition, the state store, and the submission sink.
pub struct GrantApplicationService<R, S> {
    form: Arc<FormModel>,
    store: Arc<ApplicationStateStore<R>>,
    sink: Arc<S>,
    address_lookup: Option<Arc<dyn AddressLookup>>,
}

impl<R, S> GrantApplicationService<R, S>
where
    R: ApplicationRepository + 'static,
    S: SubmissionSink + 'static,
{
    pub fn new(form: Arc<FormModel>, store: Arc<ApplicationStateStore<R>>, sink: Arc<S>) -> Self {
        Self {
            form,
            store,
            sink,
            address_lookup: None,
        }
    }

    pub fn with_address_lookup(mut self, lookup: Arc<dyn AddressLookup>) -> Self {
        self.address_lookup = Some(lookup);
        self
    }

    pub fn form(&self) -> &FormModel {
        &self.form
    }

    fn validation_context(&self) -> ValidationContext<'_> {
        let ctx = ValidationContext::new(self.store.now().date_naive());
        match &self.address_lookup {
            Some(lookup) => ctx.with_address_lookup(lookup.as_ref()),
            None => ctx,
        }
    }

    fn resolver(&self) -> NavigationResolver<'_> {
        NavigationResolver::new(&self.form)
    }

    /// Create a pending application and point at the first step.
    pub fn start(
        &self,
        user: &UserId,
    ) -> Result<(PendingApplication, Destination), ApplicationServiceError> {
        let application = self.store.create_new_application(user, self.form.id())?;
        let destination = Destination::Step {
            section: 0,
            step: 0,
            url: self.form.step_url(0, 0)?,
        };
        Ok((application, destination))
    }

    /// Pick up where the applicant left off: the first applicable step with errors, else the
    /// summary page.
    pub fn resume(
        &self,
        id: &ApplicationId,
        user: &UserId,
    ) -> Result<Resume, ApplicationServiceError> {
        let Some(application) = self.store.get_application(id, user)? else {
            info!(application_id = %id, "no live application; redirecting to form root");
            return Ok(Resume::Redirect(self.resolver().form_root()));
        };

        let destination = self
            .resolver()
            .first_incomplete(&application.data(), &self.validation_context());
        Ok(Resume::Continue {
            application,
            destination,
        })
    }

    /// Merge the step's answers over the saved ones, persist the whole snapshot (even when
    /// the step has errors), then validate and navigate.
    pub fn save_step(
        &self,
        id: &ApplicationId,
        user: &UserId,
        section: usize,
        step: usize,
        answers: FormData,
    ) -> Result<StepSave, ApplicationServiceError> {
        self.form.step(section, step)?;

        let Some(existing) = self.store.get_application(id, user)? else {
            return Ok(StepSave::Redirect(self.resolver().form_root()));
        };

        let mut merged = existing.data();
        merged.extend(answers);
        let application = self.store.save_application_state(id, user, merged)?;

        let outcome = self.resolver().advance(
            section,
            step,
            &application.data(),
            &self.validation_context(),
        )?;
        Ok(StepSave::Saved {
            application,
            outcome,
        })
    }

    /// Validate the whole form, send it to the sink, record the submitted application, and
    /// delete the pending one.
    pub fn submit(
        &self,
        id: &ApplicationId,
        user: &UserId,
        locale: Locale,
    ) -> Result<SubmitOutcome, ApplicationServiceError> {
        let Some(pending) = self.store.get_application(id, user)? else {
            return Ok(SubmitOutcome::Redirect(self.resolver().form_root()));
        };

        let data = pending.data();
        let validation = self.form.validate(&data, &self.validation_context());
        if !validation.is_valid() {
            info!(
                application_id = %id,
                errors = validation.errors.len(),
                "submission blocked by validation errors"
            );
            return Ok(SubmitOutcome::Invalid(validation));
        }

        let attempts = self.store.record_submission_attempt(id, user)?;
        let summary = self.form.get_steps_with_values(locale, &validation.value);
        let outbound = OutboundSubmission {
            application_id: pending.id,
            user_id: pending.user_id.clone(),
            form_id: pending.form_id.clone(),
            locale,
            answers: validation.value.clone(),
            summary: summary.clone(),
        };

        let receipt = self.sink.submit(&outbound).map_err(|err| {
            warn!(application_id = %id, attempts, error = %err, "submission failed");
            err
        })?;

        let overview = self.form.overview(locale, &validation.value);
        let submitted = self
            .store
            .create_from_pending_application(&pending, overview, summary, receipt)?;
        self.store.delete_application(id, user)?;

        info!(application_id = %id, attempts, "application submitted");
        Ok(SubmitOutcome::Submitted(submitted))
    }

    pub fn delete(
        &self,
        id: &ApplicationId,
        user: &UserId,
    ) -> Result<bool, ApplicationServiceError> {
        Ok(self.store.delete_application(id, user)?)
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}
