use chrono::NaiveDate;
use serde_json::{json, Value};

use grant_forms::workflows::grants::{
    Condition, Destination, FieldDefinition, FieldKind, FieldOption, FormData, FormModel,
    NavigationResolver, SectionDefinition, StepDefinition, StepOutcome, ValidationContext,
};

fn ctx() -> ValidationContext<'static> {
    ValidationContext::new(NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"))
}

fn data(value: Value) -> FormData {
    value.as_object().cloned().unwrap_or_default()
}

fn text_step(name: &str) -> StepDefinition {
    StepDefinition::new(name).field(
        FieldDefinition::builder(
            name,
            FieldKind::Text {
                max_length: Some(40),
            },
        )
        .label(name)
        .build(),
    )
}

/// Project[Name, Country] then Contacts[SeniorContact].
fn project_form() -> FormModel {
    FormModel::builder("project", "Project")
        .section(
            SectionDefinition::new("project", "Project")
                .step(text_step("projectName"))
                .step(
                    StepDefinition::new("Country").field(
                        FieldDefinition::builder("projectCountry", FieldKind::Radio)
                            .label("Country")
                            .option(FieldOption::new("england", "England"))
                            .option(FieldOption::new("wales", "Wales"))
                            .build(),
                    ),
                ),
        )
        .section(SectionDefinition::new("contacts", "Contacts").step(text_step("seniorContact")))
        .build()
        .expect("valid form")
}

#[test]
fn walks_forward_through_sections_to_the_summary() {
    let form = project_form();
    let resolver = NavigationResolver::new(&form);
    let answers = data(json!({
        "projectName": "Garden",
        "projectCountry": "england",
        "seniorContact": "Ann"
    }));

    let mut urls = Vec::new();
    let mut position = (0, 0);
    loop {
        match resolver
            .advance(position.0, position.1, &answers, &ctx())
            .expect("known step")
        {
            StepOutcome::Proceed {
                destination: Destination::Step { section, step, url },
                ..
            } => {
                urls.push(url);
                position = (section, step);
            }
            StepOutcome::Proceed { destination, .. } => {
                urls.push(destination.url().to_string());
                break;
            }
            StepOutcome::Blocked(report) => panic!("unexpected errors: {:?}", report.errors),
        }
    }

    assert_eq!(
        urls,
        vec![
            "/apply/project/project/2",
            "/apply/project/contacts/1",
            "/apply/project/summary",
        ]
    );
}

#[test]
fn walks_back_to_the_form_root() {
    let form = project_form();
    let resolver = NavigationResolver::new(&form);
    let answers = FormData::new();

    let back = resolver.previous(1, 0, &answers).expect("known step");
    assert_eq!(back.url(), "/apply/project/project/2");
    let back = resolver.previous(0, 1, &answers).expect("known step");
    assert_eq!(back.url(), "/apply/project/project/1");
    let back = resolver.previous(0, 0, &answers).expect("known step");
    assert_eq!(
        back,
        Destination::FormRoot {
            url: "/apply/project".to_string()
        }
    );
}

#[test]
fn skips_steps_whose_condition_fails() {
    let form = FormModel::builder("skip", "Skip")
        .section(
            SectionDefinition::new("only", "Only")
                .step(text_step("a"))
                .step(text_step("b").when(Condition::new(|_| false)))
                .step(text_step("c")),
        )
        .build()
        .expect("valid form");
    let resolver = NavigationResolver::new(&form);
    let answers = data(json!({ "a": "first" }));

    assert_eq!(
        resolver.next(0, 0, &answers).expect("next").url(),
        "/apply/skip/only/3"
    );
    assert_eq!(
        resolver.previous(0, 2, &answers).expect("previous").url(),
        "/apply/skip/only/1"
    );
}

#[test]
fn invalid_step_blocks_and_reports_errors() {
    let form = project_form();
    let resolver = NavigationResolver::new(&form);

    match resolver
        .advance(0, 1, &data(json!({ "projectCountry": "france" })), &ctx())
        .expect("known step")
    {
        StepOutcome::Blocked(report) => {
            assert!(report.error("projectCountry").is_some());
            assert!(report.error("projectName").is_none());
        }
        other => panic!("expected blocked step, got {other:?}"),
    }
}

#[test]
fn resume_targets_the_first_incomplete_step() {
    let form = project_form();
    let resolver = NavigationResolver::new(&form);

    let partial = data(json!({ "projectName": "Garden" }));
    assert_eq!(
        resolver.first_incomplete(&partial, &ctx()).url(),
        "/apply/project/project/2"
    );

    let complete = data(json!({
        "projectName": "Garden",
        "projectCountry": "wales",
        "seniorContact": "Ann"
    }));
    assert_eq!(
        resolver.first_incomplete(&complete, &ctx()).url(),
        "/apply/project/summary"
    );
}

#[test]
fn out_of_range_steps_are_rejected() {
    let form = project_form();
    let resolver = NavigationResolver::new(&form);
    assert!(resolver.next(2, 0, &FormData::new()).is_err());
    assert!(resolver.previous(0, 5, &FormData::new()).is_err());
    assert!(form.step_url(1, 1).is_err());
}
