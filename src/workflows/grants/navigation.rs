//! Next/previous resolution over `(section, step)` coordinates. Conditions are evaluated
//! against the latest merged answers on every call, so a later answer can open or close an
//! earlier branch.

use serde::Serialize;
use tracing::debug;

use super::condition::FormData;
use super::form::FormModel;
use super::rules::ValidationContext;
use super::steps::ValidationReport;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no step {step} in section {section}")]
    UnknownStep { section: usize, step: usize },
}

/// Where the caller should send the applicant next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Destination {
    Step {
        section: usize,
        step: usize,
        url: String,
    },
    Summary {
        url: String,
    },
    FormRoot {
        url: String,
    },
}

impl Destination {
    pub fn url(&self) -> &str {
        match self {
            Destination::Step { url, .. }
            | Destination::Summary { url }
            | Destination::FormRoot { url } => url,
        }
    }
}

/// Result of trying to leave a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Proceed {
        destination: Destination,
        validation: ValidationReport,
    },
    /// The step applies and has errors; the applicant stays put.
    Blocked(ValidationReport),
}

pub struct NavigationResolver<'a> {
    form: &'a FormModel,
}

impl<'a> NavigationResolver<'a> {
    pub fn new(form: &'a FormModel) -> Self {
        Self { form }
    }

    fn step_destination(
        &self,
        section: usize,
        step: usize,
    ) -> Result<Destination, NavigationError> {
        Ok(Destination::Step {
            section,
            step,
            url: self.form.step_url(section, step)?,
        })
    }

    pub fn form_root(&self) -> Destination {
        Destination::FormRoot {
            url: self.form.root_url().to_string(),
        }
    }

    /// First matching step after the current one in this section, else the first step of the
    /// next section, else the summary page.
    pub fn next(
        &self,
        section: usize,
        step: usize,
        data: &FormData,
    ) -> Result<Destination, NavigationError> {
        self.form.step(section, step)?;
        let steps = self.form.sections()[section].steps();

        if let Some(offset) = steps[step + 1..]
            .iter()
            .position(|candidate| candidate.matches(data))
        {
            return self.step_destination(section, step + 1 + offset);
        }

        if section + 1 < self.form.sections().len() {
            return self.step_destination(section + 1, 0);
        }

        Ok(Destination::Summary {
            url: self.form.summary_url(),
        })
    }

    /// Last matching step before the current one in this section, else the last step of the
    /// previous section (not checked against its condition), else the form root.
    pub fn previous(
        &self,
        section: usize,
        step: usize,
        data: &FormData,
    ) -> Result<Destination, NavigationError> {
        self.form.step(section, step)?;
        let steps = self.form.sections()[section].steps();

        if let Some(index) = steps[..step]
            .iter()
            .rposition(|candidate| candidate.matches(data))
        {
            return self.step_destination(section, index);
        }

        if section > 0 {
            let previous = section - 1;
            let last = self.form.sections()[previous].steps().len() - 1;
            return self.step_destination(previous, last);
        }

        Ok(self.form_root())
    }

    /// The first applicable step that does not validate yet, or the summary page.
    pub fn first_incomplete(&self, data: &FormData, ctx: &ValidationContext<'_>) -> Destination {
        for (section, step, definition) in self.form.all_steps() {
            if !definition.matches(data) {
                continue;
            }
            let complete = self
                .form
                .validate_step(section, step, data, ctx)
                .map(|report| report.is_valid())
                .unwrap_or(false);
            if !complete {
                if let Ok(destination) = self.step_destination(section, step) {
                    return destination;
                }
            }
        }
        Destination::Summary {
            url: self.form.summary_url(),
        }
    }

    /// Validate the current step and move forward unless it applies and has errors.
    pub fn advance(
        &self,
        section: usize,
        step: usize,
        data: &FormData,
        ctx: &ValidationContext<'_>,
    ) -> Result<StepOutcome, NavigationError> {
        let validation = self.form.validate_step(section, step, data, ctx)?;
        let applies = self.form.step(section, step)?.matches(data);

        if applies && !validation.is_valid() {
            debug!(
                section,
                step,
                errors = validation.errors.len(),
                "step has errors; staying put"
            );
            return Ok(StepOutcome::Blocked(validation));
        }

        Ok(StepOutcome::Proceed {
            destination: self.next(section, step, data)?,
            validation,
        })
    }
}
