use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FormModel;
use crate::workflows::grants::condition::FormData;
use crate::workflows::grants::fields::FieldDefinition;
use crate::workflows::grants::locale::Locale;
use crate::workflows::grants::steps::StepDefinition;

/// Per-request view of a form: localized strings and bound answers. The shared definition is
/// left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedForm {
    pub id: String,
    pub locale: Locale,
    pub title: String,
    pub sections: Vec<EnhancedSection>,
}

impl EnhancedForm {
    pub fn field(&self, name: &str) -> Option<&BoundField> {
        self.sections
            .iter()
            .flat_map(|section| section.steps.iter())
            .flat_map(|step| step.fieldsets.iter())
            .flat_map(|fieldset| fieldset.fields.iter())
            .find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedSection {
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub steps: Vec<EnhancedStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedStep {
    pub title: String,
    pub url: String,
    pub not_required: bool,
    pub fieldsets: Vec<EnhancedFieldset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedFieldset {
    pub legend: Option<String>,
    pub fields: Vec<BoundField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub label: String,
    pub explanation: Option<String>,
    pub is_required: bool,
    pub value: Option<Value>,
    pub display_value: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<BoundOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundOption {
    pub value: String,
    pub label: String,
    pub explanation: Option<String>,
}

/// One answered step for the summary page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub section: String,
    pub title: String,
    pub url: String,
    pub fields: Vec<FieldSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub name: String,
    pub label: String,
    pub display_value: String,
}

fn bind_field(field: &FieldDefinition, locale: Locale, data: &FormData) -> BoundField {
    let bound = field.clone().with_value(data.get(field.name()).cloned());
    let options = field
        .visible_options(data)
        .into_iter()
        .map(|option| BoundOption {
            value: option.value.clone(),
            label: option.label.localize(locale),
            explanation: option
                .explanation
                .as_ref()
                .map(|text| text.localize(locale)),
        })
        .collect();

    BoundField {
        name: field.name().to_string(),
        type_name: field.kind().type_name(),
        label: field.label().localize(locale),
        explanation: field.explanation().map(|text| text.localize(locale)),
        is_required: field.is_required(),
        display_value: bound.display_value(locale),
        word_count: bound.word_count(),
        value: bound.value().cloned(),
        options,
    }
}

fn enhance_step(
    step: &StepDefinition,
    url: String,
    locale: Locale,
    data: &FormData,
) -> EnhancedStep {
    EnhancedStep {
        title: step.title().localize(locale),
        url,
        not_required: !step.matches(data),
        fieldsets: step
            .fieldsets()
            .iter()
            .map(|fieldset| EnhancedFieldset {
                legend: fieldset.legend_text().map(|text| text.localize(locale)),
                fields: fieldset
                    .fields()
                    .iter()
                    .map(|field| bind_field(field, locale, data))
                    .collect(),
            })
            .collect(),
    }
}

impl FormModel {
    /// Localize every string, filter choice options by the answers, bind values, and flag
    /// steps whose condition fails against this same snapshot.
    pub fn enhance(&self, locale: Locale, data: &FormData) -> EnhancedForm {
        let sections = self
            .sections
            .iter()
            .map(|section| EnhancedSection {
                slug: section.slug().to_string(),
                title: section.title().localize(locale),
                summary: section.summary_text().map(|text| text.localize(locale)),
                steps: section
                    .steps()
                    .iter()
                    .enumerate()
                    .map(|(index, step)| {
                        let url = format!("{}/{}/{}", self.base_url, section.slug(), index + 1);
                        enhance_step(step, url, locale, data)
                    })
                    .collect(),
            })
            .collect();

        EnhancedForm {
            id: self.id.clone(),
            locale,
            title: self.title.localize(locale),
            sections,
        }
    }

    /// Applicable steps with their answered fields, in form order.
    pub fn get_steps_with_values(&self, locale: Locale, data: &FormData) -> Vec<StepSummary> {
        self.enhance(locale, data)
            .sections
            .into_iter()
            .flat_map(|section| {
                let slug = section.slug;
                section
                    .steps
                    .into_iter()
                    .filter(|step| !step.not_required)
                    .map(move |step| StepSummary {
                        section: slug.clone(),
                        title: step.title,
                        url: step.url,
                        fields: step
                            .fieldsets
                            .into_iter()
                            .flat_map(|fieldset| fieldset.fields)
                            .filter(|field| !field.display_value.is_empty())
                            .map(|field| FieldSummary {
                                name: field.name,
                                label: field.label,
                                display_value: field.display_value,
                            })
                            .collect(),
                    })
            })
            .filter(|summary| !summary.fields.is_empty())
            .collect()
    }
}
