use std::collections::HashSet;

use serde_json::Value;

use super::FormModel;
use crate::workflows::grants::condition::FormData;
use crate::workflows::grants::navigation::NavigationError;
use crate::workflows::grants::rules::{
    compare_object, date_on_or_after, date_within_range, project_total_covers_budget, Offset,
    RuleError, ValidationContext,
};
use crate::workflows::grants::steps::ValidationReport;

/// A constraint between two answers. The error is always reported on `target()`.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossFieldRule {
    /// Object-valued answers must not hold the same values, e.g. two contacts.
    MustDiffer { field: String, other: String },
    DateOnOrAfter { field: String, reference: String },
    DateWithinRange {
        field: String,
        reference: String,
        limit: Offset,
    },
    ProjectTotalCoversBudget {
        total_field: String,
        budget_field: String,
    },
}

impl CrossFieldRule {
    pub fn target(&self) -> &str {
        match self {
            CrossFieldRule::MustDiffer { field, .. }
            | CrossFieldRule::DateOnOrAfter { field, .. }
            | CrossFieldRule::DateWithinRange { field, .. } => field,
            CrossFieldRule::ProjectTotalCoversBudget { total_field, .. } => total_field,
        }
    }

    pub(crate) fn fields(&self) -> impl Iterator<Item = &str> {
        let other = match self {
            CrossFieldRule::MustDiffer { other, .. } => other,
            CrossFieldRule::DateOnOrAfter { reference, .. }
            | CrossFieldRule::DateWithinRange { reference, .. } => reference,
            CrossFieldRule::ProjectTotalCoversBudget { budget_field, .. } => budget_field,
        };
        [self.target(), other.as_str()].into_iter()
    }

    pub fn check(&self, data: &FormData) -> Result<(), RuleError> {
        let get = |name: &str| data.get(name).unwrap_or(&Value::Null);
        match self {
            CrossFieldRule::MustDiffer { field, other } => compare_object(get(field), get(other)),
            CrossFieldRule::DateOnOrAfter { field, reference } => {
                date_on_or_after(get(field), get(reference))
            }
            CrossFieldRule::DateWithinRange {
                field,
                reference,
                limit,
            } => date_within_range(get(field), get(reference), *limit),
            CrossFieldRule::ProjectTotalCoversBudget {
                total_field,
                budget_field,
            } => project_total_covers_budget(get(total_field), get(budget_field)),
        }
    }
}

impl FormModel {
    /// Validate one step against the merged answers, including cross-field rules that target
    /// a field on the step.
    pub fn validate_step(
        &self,
        section: usize,
        step: usize,
        data: &FormData,
        ctx: &ValidationContext<'_>,
    ) -> Result<ValidationReport, NavigationError> {
        self.step(section, step)?;
        Ok(self.validate_step_unchecked(section, step, data, ctx))
    }

    pub(super) fn validate_step_unchecked(
        &self,
        section: usize,
        step: usize,
        data: &FormData,
        ctx: &ValidationContext<'_>,
    ) -> ValidationReport {
        let definition = &self.sections[section].steps()[step];
        let mut report = definition.validate(data, ctx);
        let targets: HashSet<&str> = definition.fields().map(|field| field.name()).collect();
        let mut answers = self.applicable_answers(data);
        answers.extend(report.value.clone());
        self.apply_cross_field_rules(&mut report, &targets, &answers);
        report
    }

    /// Validate every applicable step. Answers to steps whose condition fails are dropped from
    /// the returned value and never produce errors.
    pub fn validate(&self, data: &FormData, ctx: &ValidationContext<'_>) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut targets = HashSet::new();

        for (_, _, step) in self.all_steps() {
            if !step.matches(data) {
                continue;
            }
            targets.extend(step.fields().map(|field| field.name()));
            report.absorb(step.validate(data, ctx));
        }

        let answers = report.value.clone();
        self.apply_cross_field_rules(&mut report, &targets, &answers);
        report
    }

    /// `data` without the answers to steps whose condition fails.
    fn applicable_answers(&self, data: &FormData) -> FormData {
        let mut answers = data.clone();
        for (_, _, step) in self.all_steps() {
            if !step.matches(data) {
                for field in step.fields() {
                    answers.remove(field.name());
                }
            }
        }
        answers
    }

    /// Second pass over the applicable answers. Never replaces a per-field error.
    fn apply_cross_field_rules(
        &self,
        report: &mut ValidationReport,
        targets: &HashSet<&str>,
        answers: &FormData,
    ) {
        for rule in &self.cross_field_rules {
            let target = rule.target();
            if !targets.contains(target) || report.errors.contains_key(target) {
                continue;
            }
            if let Err(error) = rule.check(answers) {
                report.errors.insert(target.to_string(), error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::grants::condition::Condition;
    use crate::workflows::grants::fields::{FieldDefinition, FieldKind};
    use crate::workflows::grants::rules::{DateConstraints, ErrorKind, TimeUnit};
    use crate::workflows::grants::steps::{SectionDefinition, StepDefinition};
    use chrono::NaiveDate;
    use serde_json::json;

    fn ctx() -> ValidationContext<'static> {
        ValidationContext::new(NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"))
    }

    fn data(value: Value) -> FormData {
        value.as_object().cloned().unwrap_or_default()
    }

    fn name(field: &str) -> FieldDefinition {
        FieldDefinition::builder(field, FieldKind::Name)
            .label("Full name")
            .build()
    }

    fn date(field: &str) -> FieldDefinition {
        FieldDefinition::builder(field, FieldKind::Date(DateConstraints::default()))
            .label("Date")
            .build()
    }

    fn form() -> FormModel {
        FormModel::builder("test", "Test")
            .section(
                SectionDefinition::new("contacts", "Contacts")
                    .step(StepDefinition::new("Main").field(name("mainContactName")))
                    .step(StepDefinition::new("Senior").field(name("seniorContactName"))),
            )
            .section(
                SectionDefinition::new("dates", "Dates")
                    .step(StepDefinition::new("Start").field(date("projectStartDate")))
                    .step(StepDefinition::new("End").field(date("projectEndDate"))),
            )
            .section(
                SectionDefinition::new("extra", "Extra").step(
                    StepDefinition::new("Extra")
                        .field(
                            FieldDefinition::builder("extraDetail", FieldKind::Email)
                                .label("Extra")
                                .build(),
                        )
                        .when(Condition::field_equals("wantsExtra", "yes")),
                ),
            )
            .cross_field(CrossFieldRule::MustDiffer {
                field: "seniorContactName".to_string(),
                other: "mainContactName".to_string(),
            })
            .cross_field(CrossFieldRule::DateOnOrAfter {
                field: "projectEndDate".to_string(),
                reference: "projectStartDate".to_string(),
            })
            .cross_field(CrossFieldRule::DateWithinRange {
                field: "projectEndDate".to_string(),
                reference: "projectStartDate".to_string(),
                limit: Offset::new(15, TimeUnit::Months),
            })
            .build()
            .expect("valid form")
    }

    #[test]
    fn matching_contacts_fail_on_the_target_step_only() {
        let answers = data(json!({
            "mainContactName": { "firstName": "Ann", "lastName": "Bee" },
            "seniorContactName": { "firstName": " ann", "lastName": "BEE " }
        }));
        let form = form();

        let main = form
            .validate_step(0, 0, &answers, &ctx())
            .expect("step exists");
        assert!(main.is_valid());

        let senior = form
            .validate_step(0, 1, &answers, &ctx())
            .expect("step exists");
        assert_eq!(
            senior.error("seniorContactName").map(|err| err.kind),
            Some(ErrorKind::ObjectsMustNotMatch)
        );
    }

    #[test]
    fn per_field_errors_take_precedence_over_cross_field_rules() {
        let answers = data(json!({
            "projectStartDate": { "day": 1, "month": 6, "year": 2025 },
            "projectEndDate": { "day": 31, "month": 2, "year": 2025 }
        }));
        let report = form()
            .validate_step(1, 1, &answers, &ctx())
            .expect("step exists");
        assert_eq!(
            report.error("projectEndDate").map(|err| err.kind),
            Some(ErrorKind::InvalidDate)
        );
    }

    #[test]
    fn end_date_rules_use_the_start_date() {
        let before = data(json!({
            "projectStartDate": { "day": 1, "month": 6, "year": 2025 },
            "projectEndDate": { "day": 1, "month": 5, "year": 2025 }
        }));
        let report = form()
            .validate_step(1, 1, &before, &ctx())
            .expect("step exists");
        assert_eq!(
            report.error("projectEndDate").map(|err| err.kind),
            Some(ErrorKind::DateBeforeReference)
        );

        let too_long = data(json!({
            "projectStartDate": { "day": 1, "month": 6, "year": 2025 },
            "projectEndDate": { "day": 2, "month": 9, "year": 2026 }
        }));
        let report = form()
            .validate_step(1, 1, &too_long, &ctx())
            .expect("step exists");
        assert_eq!(
            report.error("projectEndDate").map(|err| err.kind),
            Some(ErrorKind::DateOutsideRange)
        );
    }

    #[test]
    fn whole_form_strips_answers_to_skipped_steps() {
        let answers = data(json!({
            "mainContactName": { "firstName": "Ann", "lastName": "Bee" },
            "seniorContactName": { "firstName": "Cat", "lastName": "Dee" },
            "projectStartDate": { "day": 1, "month": 6, "year": 2025 },
            "projectEndDate": { "day": 1, "month": 12, "year": 2025 },
            "wantsExtra": "no",
            "extraDetail": "not an email"
        }));
        let report = form().validate(&answers, &ctx());
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
        assert!(!report.value.contains_key("extraDetail"));
        assert_eq!(
            report.value["projectEndDate"],
            json!({ "day": 1, "month": 12, "year": 2025 })
        );
    }

    #[test]
    fn answers_to_skipped_steps_do_not_feed_cross_field_rules() {
        let form = FormModel::builder("test", "Test")
            .section(
                SectionDefinition::new("contacts", "Contacts")
                    .step(StepDefinition::new("Main").field(name("mainContactName")))
                    .step(
                        StepDefinition::new("Senior")
                            .field(name("seniorContactName"))
                            .when(Condition::field_equals("hasSenior", "yes")),
                    ),
            )
            .cross_field(CrossFieldRule::MustDiffer {
                field: "mainContactName".to_string(),
                other: "seniorContactName".to_string(),
            })
            .build()
            .expect("valid form");
        let mut answers = data(json!({
            "hasSenior": "no",
            "mainContactName": { "firstName": "Ann", "lastName": "Bee" },
            "seniorContactName": { "firstName": "Ann", "lastName": "Bee" }
        }));

        let report = form.validate(&answers, &ctx());
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
        assert!(!report.value.contains_key("seniorContactName"));

        let step = form
            .validate_step(0, 0, &answers, &ctx())
            .expect("step exists");
        assert!(step.is_valid(), "unexpected errors: {:?}", step.errors);

        answers.insert("hasSenior".to_string(), json!("yes"));
        let step = form
            .validate_step(0, 0, &answers, &ctx())
            .expect("step exists");
        assert_eq!(
            step.error("mainContactName").map(|err| err.kind),
            Some(ErrorKind::ObjectsMustNotMatch)
        );
    }

    #[test]
    fn unknown_step_is_an_error() {
        assert_eq!(
            form().validate_step(4, 0, &FormData::new(), &ctx()),
            Err(NavigationError::UnknownStep {
                section: 4,
                step: 0
            })
        );
    }
}
