//! The full declarative definition of one form, plus the per-request operations the web
//! layer calls: binding answers, summarising them, and validating steps or the whole form.

mod enhance;
mod validation;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::condition::FormData;
use super::fields::FieldDefinition;
use super::locale::{Locale, LocalizedText};
use super::navigation::NavigationError;
use super::rules::{is_empty_value, RuleError, ValidationContext};
use super::steps::{SectionDefinition, StepDefinition};

pub use enhance::{
    BoundField, BoundOption, EnhancedFieldset, EnhancedForm, EnhancedSection, EnhancedStep,
    FieldSummary, StepSummary,
};
pub use validation::CrossFieldRule;

/// Structural problems caught when a form is assembled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormDefinitionError {
    #[error("form has no sections")]
    NoSections,
    #[error("section `{0}` has no steps")]
    EmptySection(String),
    #[error("section slug `{0}` is used more than once")]
    DuplicateSection(String),
    #[error("field name `{0}` is used more than once")]
    DuplicateField(String),
    #[error("rule references unknown field `{0}`")]
    UnknownField(String),
}

/// Which answers describe the application on dashboards and in the submitted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewSpec {
    pub title_field: String,
    pub country_field: Option<String>,
    pub overview_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationOverview {
    pub title: Option<String>,
    pub country: Option<String>,
    pub overview: Vec<OverviewRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionProgress {
    pub slug: String,
    pub status: ProgressStatus,
}

/// Immutable form definition, shared across requests.
#[derive(Debug, Clone)]
pub struct FormModel {
    id: String,
    title: LocalizedText,
    base_url: String,
    sections: Vec<SectionDefinition>,
    cross_field_rules: Vec<CrossFieldRule>,
    overview: Option<OverviewSpec>,
}

impl FormModel {
    pub fn builder(id: impl Into<String>, title: impl Into<LocalizedText>) -> FormBuilder {
        let id = id.into();
        FormBuilder {
            base_url: format!("/apply/{id}"),
            id,
            title: title.into(),
            sections: Vec::new(),
            cross_field_rules: Vec::new(),
            overview: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &LocalizedText {
        &self.title
    }

    pub fn sections(&self) -> &[SectionDefinition] {
        &self.sections
    }

    pub fn cross_field_rules(&self) -> &[CrossFieldRule] {
        &self.cross_field_rules
    }

    pub fn step(&self, section: usize, step: usize) -> Result<&StepDefinition, NavigationError> {
        self.sections
            .get(section)
            .and_then(|definition| definition.steps().get(step))
            .ok_or(NavigationError::UnknownStep { section, step })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.all_steps()
            .find_map(|(_, _, step)| step.find_field(name))
    }

    pub(crate) fn all_steps(&self) -> impl Iterator<Item = (usize, usize, &StepDefinition)> {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(section_index, section)| {
                section
                    .steps()
                    .iter()
                    .enumerate()
                    .map(move |(step_index, step)| (section_index, step_index, step))
            })
    }

    pub fn root_url(&self) -> &str {
        &self.base_url
    }

    pub fn summary_url(&self) -> String {
        format!("{}/summary", self.base_url)
    }

    /// `{base}/{slug}/{n}` with a 1-based step number.
    pub fn step_url(&self, section: usize, step: usize) -> Result<String, NavigationError> {
        self.step(section, step)?;
        let slug = self.sections[section].slug();
        Ok(format!("{}/{}/{}", self.base_url, slug, step + 1))
    }

    /// Resolve a `/{slug}/{n}` address back to zero-based indices.
    pub fn locate(&self, slug: &str, step_number: usize) -> Option<(usize, usize)> {
        let section = self
            .sections
            .iter()
            .position(|section| section.slug() == slug)?;
        let step = step_number.checked_sub(1)?;
        self.sections[section].steps().get(step)?;
        Some((section, step))
    }

    /// Resolve a localized message for every error in `errors`, keyed by field name.
    pub fn error_messages(
        &self,
        errors: &BTreeMap<String, RuleError>,
        locale: Locale,
    ) -> BTreeMap<String, String> {
        errors
            .iter()
            .filter_map(|(name, error)| {
                self.field(name)
                    .map(|field| (name.clone(), field.error_message(error, locale)))
            })
            .collect()
    }

    /// Per-section completion over the applicable steps.
    pub fn progress(&self, data: &FormData, ctx: &ValidationContext<'_>) -> Vec<SectionProgress> {
        self.sections
            .iter()
            .enumerate()
            .map(|(section_index, section)| {
                let applicable: Vec<usize> = section
                    .steps()
                    .iter()
                    .enumerate()
                    .filter(|(_, step)| step.matches(data))
                    .map(|(index, _)| index)
                    .collect();

                let started = applicable
                    .iter()
                    .any(|&index| section.steps()[index].has_answers(data));
                let status = if !started {
                    ProgressStatus::NotStarted
                } else if applicable.iter().all(|&index| {
                    self.validate_step_unchecked(section_index, index, data, ctx)
                        .is_valid()
                }) {
                    ProgressStatus::Complete
                } else {
                    ProgressStatus::InProgress
                };

                SectionProgress {
                    slug: section.slug().to_string(),
                    status,
                }
            })
            .collect()
    }

    /// Title, country, and overview rows, when the form declares where they come from.
    pub fn overview(&self, locale: Locale, data: &FormData) -> ApplicationOverview {
        let Some(spec) = &self.overview else {
            return ApplicationOverview::default();
        };

        let display = |name: &str| {
            let field = self.field(name)?;
            let value = data.get(name).filter(|value| !is_empty_value(value))?;
            let text = field
                .clone()
                .with_value(value.clone())
                .display_value(locale);
            (!text.is_empty()).then(|| (field.label().localize(locale), text))
        };

        ApplicationOverview {
            title: display(spec.title_field.as_str()).map(|(_, text)| text),
            country: spec
                .country_field
                .as_deref()
                .and_then(display)
                .map(|(_, text)| text),
            overview: spec
                .overview_fields
                .iter()
                .filter_map(|name| display(name))
                .map(|(label, value)| OverviewRow { label, value })
                .collect(),
        }
    }
}

/// Assembles a [`FormModel`] and checks it for structural mistakes.
#[derive(Debug, Clone)]
pub struct FormBuilder {
    id: String,
    title: LocalizedText,
    base_url: String,
    sections: Vec<SectionDefinition>,
    cross_field_rules: Vec<CrossFieldRule>,
    overview: Option<OverviewSpec>,
}

impl FormBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn section(mut self, section: SectionDefinition) -> Self {
        self.sections.push(section);
        self
    }

    pub fn cross_field(mut self, rule: CrossFieldRule) -> Self {
        self.cross_field_rules.push(rule);
        self
    }

    pub fn overview(mut self, spec: OverviewSpec) -> Self {
        self.overview = Some(spec);
        self
    }

    pub fn build(self) -> Result<FormModel, FormDefinitionError> {
        if self.sections.is_empty() {
            return Err(FormDefinitionError::NoSections);
        }

        let mut slugs = HashSet::new();
        let mut names = HashSet::new();
        for section in &self.sections {
            if !slugs.insert(section.slug().to_string()) {
                return Err(FormDefinitionError::DuplicateSection(
                    section.slug().to_string(),
                ));
            }
            if section.steps().is_empty() {
                return Err(FormDefinitionError::EmptySection(section.slug().to_string()));
            }
            let fields = section.steps().iter().flat_map(StepDefinition::fields);
            for field in fields {
                if !names.insert(field.name().to_string()) {
                    return Err(FormDefinitionError::DuplicateField(field.name().to_string()));
                }
            }
        }

        let referenced = self
            .cross_field_rules
            .iter()
            .flat_map(CrossFieldRule::fields)
            .chain(self.overview.iter().flat_map(|spec| {
                std::iter::once(spec.title_field.as_str())
                    .chain(spec.country_field.as_deref())
                    .chain(spec.overview_fields.iter().map(String::as_str))
            }));
        for name in referenced {
            if !names.contains(name) {
                return Err(FormDefinitionError::UnknownField(name.to_string()));
            }
        }

        Ok(FormModel {
            id: self.id,
            title: self.title,
            base_url: self.base_url,
            sections: self.sections,
            cross_field_rules: self.cross_field_rules,
            overview: self.overview,
        })
    }
}
