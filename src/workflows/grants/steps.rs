use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::condition::{Condition, FormData};
use super::fields::FieldDefinition;
use super::locale::LocalizedText;
use super::rules::{is_empty_value, ErrorKind, RuleError, ValidationContext};

/// Coerced answers plus the first error per field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub value: FormData,
    pub errors: BTreeMap<String, RuleError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: &str) -> Option<&RuleError> {
        self.errors.get(field)
    }

    pub(crate) fn absorb(&mut self, other: ValidationReport) {
        self.value.extend(other.value);
        self.errors.extend(other.errors);
    }
}

/// A titled group of fields rendered together.
#[derive(Debug, Clone)]
pub struct Fieldset {
    legend: Option<LocalizedText>,
    fields: Vec<FieldDefinition>,
}

impl Fieldset {
    pub fn new(fields: impl IntoIterator<Item = FieldDefinition>) -> Self {
        Self {
            legend: None,
            fields: fields.into_iter().collect(),
        }
    }

    pub fn legend(mut self, legend: impl Into<LocalizedText>) -> Self {
        self.legend = Some(legend.into());
        self
    }

    pub fn legend_text(&self) -> Option<&LocalizedText> {
        self.legend.as_ref()
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }
}

/// One page of the form. A step whose condition fails is skipped by navigation and left out
/// of whole-form validation, but stays addressable.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    title: LocalizedText,
    fieldsets: Vec<Fieldset>,
    matches_condition: Option<Condition>,
}

impl StepDefinition {
    pub fn new(title: impl Into<LocalizedText>) -> Self {
        Self {
            title: title.into(),
            fieldsets: Vec::new(),
            matches_condition: None,
        }
    }

    pub fn fieldset(mut self, fieldset: Fieldset) -> Self {
        self.fieldsets.push(fieldset);
        self
    }

    /// Shorthand for a step holding a single unlabelled fieldset.
    pub fn field(self, field: FieldDefinition) -> Self {
        self.fieldset(Fieldset::new([field]))
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.matches_condition = Some(condition);
        self
    }

    pub fn title(&self) -> &LocalizedText {
        &self.title
    }

    pub fn fieldsets(&self) -> &[Fieldset] {
        &self.fieldsets
    }

    pub fn matches(&self, data: &FormData) -> bool {
        self.matches_condition
            .as_ref()
            .map(|condition| condition.evaluate(data))
            .unwrap_or(true)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fieldsets
            .iter()
            .flat_map(|fieldset| fieldset.fields.iter())
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields().find(|field| field.name() == name)
    }

    /// Validate this step's fields against the merged data. Per-field only; cross-field rules
    /// are applied by the form.
    pub fn validate(&self, data: &FormData, ctx: &ValidationContext<'_>) -> ValidationReport {
        let mut report = ValidationReport::default();

        for field in self.fields() {
            let bound = field.clone().with_value(data.get(field.name()).cloned());
            let mut outcome = bound.validate_with(ctx);

            if outcome.error.is_none() {
                if let Some(value) = &outcome.value {
                    if selects_hidden_option(field, value, data) {
                        outcome.error = Some(RuleError::new(ErrorKind::InvalidOption));
                    }
                }
            }

            if let Some(value) = outcome.value {
                report.value.insert(field.name().to_string(), value);
            }
            if let Some(error) = outcome.error {
                report.errors.insert(field.name().to_string(), error);
            }
        }

        report
    }

    /// Whether any field on this step has been answered.
    pub fn has_answers(&self, data: &FormData) -> bool {
        self.fields().any(|field| {
            data.get(field.name())
                .map(|value| !is_empty_value(value))
                .unwrap_or(false)
        })
    }
}

fn selects_hidden_option(field: &FieldDefinition, value: &Value, data: &FormData) -> bool {
    if !field.kind().is_choice() {
        return false;
    }
    let selected: Vec<&str> = match value {
        Value::String(single) => vec![single.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    field.options().iter().any(|option| {
        selected.contains(&option.value.as_str()) && !option.is_visible(data)
    })
}

/// Ordered steps sharing a URL slug.
#[derive(Debug, Clone)]
pub struct SectionDefinition {
    slug: String,
    title: LocalizedText,
    summary: Option<LocalizedText>,
    steps: Vec<StepDefinition>,
}

impl SectionDefinition {
    pub fn new(slug: impl Into<String>, title: impl Into<LocalizedText>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            summary: None,
            steps: Vec::new(),
        }
    }

    pub fn summary(mut self, summary: impl Into<LocalizedText>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn title(&self) -> &LocalizedText {
        &self.title
    }

    pub fn summary_text(&self) -> Option<&LocalizedText> {
        self.summary.as_ref()
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::grants::fields::{FieldKind, FieldOption};
    use chrono::NaiveDate;
    use serde_json::json;

    fn ctx() -> ValidationContext<'static> {
        ValidationContext::new(NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"))
    }

    fn data(value: Value) -> FormData {
        value.as_object().cloned().unwrap_or_default()
    }

    fn contact_step() -> StepDefinition {
        StepDefinition::new("Main contact").fieldset(
            Fieldset::new([
                FieldDefinition::builder("mainContactEmail", FieldKind::Email)
                    .label("Email")
                    .build(),
                FieldDefinition::builder("mainContactPhone", FieldKind::Phone)
                    .label("Phone")
                    .optional()
                    .build(),
            ])
            .legend("Contact details"),
        )
    }

    #[test]
    fn step_collects_values_and_errors_per_field() {
        let answers = data(json!({
            "mainContactEmail": "not-an-email",
            "mainContactPhone": "0044 7700 900123"
        }));
        let report = contact_step().validate(&answers, &ctx());
        assert_eq!(
            report.error("mainContactEmail").map(|err| err.kind),
            Some(ErrorKind::InvalidEmail)
        );
        assert_eq!(report.value["mainContactPhone"], json!("07700 900123"));
        assert!(!report.is_valid());
    }

    #[test]
    fn condition_defaults_to_matching() {
        let step = contact_step();
        assert!(step.matches(&FormData::new()));

        let gated = contact_step().when(Condition::field_equals("hasContact", "yes"));
        assert!(!gated.matches(&FormData::new()));
        assert!(gated.matches(&data(json!({ "hasContact": "yes" }))));
    }

    #[test]
    fn hidden_option_selection_is_invalid() {
        let step = StepDefinition::new("Language").field(
            FieldDefinition::builder("language", FieldKind::Radio)
                .label("Language")
                .option(FieldOption::new("english", "English"))
                .option(
                    FieldOption::new("welsh", "Welsh")
                        .show_when(Condition::field_equals("country", "wales")),
                )
                .build(),
        );

        let england = data(json!({ "language": "welsh", "country": "england" }));
        let report = step.validate(&england, &ctx());
        assert_eq!(
            report.error("language").map(|err| err.kind),
            Some(ErrorKind::InvalidOption)
        );

        let wales = data(json!({ "language": "welsh", "country": "wales" }));
        let report = step.validate(&wales, &ctx());
        assert!(report.is_valid());
    }

    #[test]
    fn answered_detection_ignores_blank_values() {
        let step = contact_step();
        assert!(!step.has_answers(&data(json!({ "mainContactEmail": "  " }))));
        assert!(step.has_answers(&data(json!({ "mainContactEmail": "a@b.com" }))));
    }
}
