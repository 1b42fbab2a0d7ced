//! The bundled community grant form. Covers every field kind, conditional steps and options,
//! and each cross-field rule; the CLI and integration tests run against it.

use super::condition::Condition;
use super::fields::{FieldBuilder, FieldDefinition, FieldKind, FieldOption};
use super::form::{CrossFieldRule, FormDefinitionError, FormModel, OverviewSpec};
use super::locale::LocalizedText;
use super::rules::{DateConstraints, DateLimit, ErrorKind, MonthYearConstraints, Offset, TimeUnit};
use super::steps::{Fieldset, SectionDefinition, StepDefinition};

pub const COMMUNITY_GRANT_ID: &str = "community-grant";

const MIN_BUDGET: u64 = 300;
const MAX_BUDGET: u64 = 10_000;
const MAX_BUDGET_ITEMS: usize = 10;

fn short_text(name: &str) -> FieldBuilder {
    FieldDefinition::builder(
        name,
        FieldKind::Text {
            max_length: Some(80),
        },
    )
}

fn text(name: &str, label: LocalizedText) -> FieldDefinition {
    short_text(name).label(label).build()
}

fn bilingual(en: &str, cy: &str) -> LocalizedText {
    LocalizedText::bilingual(en, cy)
}

fn country_is(country: &'static str) -> Condition {
    Condition::field_equals("projectCountry", country)
}

fn your_project() -> SectionDefinition {
    let name = text(
        "projectName",
        bilingual(
            "What is the name of your project?",
            "Beth yw enw eich prosiect?",
        ),
    );

    let earliest = DateLimit::AfterToday(Offset::new(12, TimeUnit::Weeks));
    let start = FieldDefinition::builder(
        "projectStartDate",
        FieldKind::Date(DateConstraints::default().min(earliest)),
    )
    .label(bilingual("Start date", "Dyddiad dechrau"))
    .message(
        ErrorKind::DateBeforeMinimum,
        "Date you start the project must be at least 12 weeks from today",
    )
    .build();

    let end = FieldDefinition::builder(
        "projectEndDate",
        FieldKind::Date(DateConstraints::default()),
    )
    .label(bilingual("End date", "Dyddiad gorffen"))
    .message(
        ErrorKind::DateBeforeReference,
        "Date you end the project must be the same as or after the start date",
    )
    .message(
        ErrorKind::DateOutsideRange,
        "Date you end the project must be within {limit} of the start date",
    )
    .build();

    let location = text(
        "projectLocationDescription",
        bilingual(
            "Where will your project take place?",
            "Ble fydd eich prosiect yn digwydd?",
        ),
    );

    SectionDefinition::new("your-project", bilingual("Your project", "Eich prosiect"))
        .summary(bilingual(
            "Tell us about your project idea.",
            "Dywedwch wrthym am syniad eich prosiect.",
        ))
        .step(
            StepDefinition::new(bilingual("Project details", "Manylion y prosiect"))
                .fieldset(Fieldset::new([name]))
                .fieldset(
                    Fieldset::new([start, end])
                        .legend(bilingual("Project dates", "Dyddiadau'r prosiect")),
                ),
        )
        .step(
            StepDefinition::new(bilingual("Project country", "Gwlad y prosiect")).field(
                FieldDefinition::builder("projectCountry", FieldKind::Radio)
                    .label(bilingual(
                        "What country will your project be based in?",
                        "Ym mha wlad fydd eich prosiect wedi'i leoli?",
                    ))
                    .options([
                        FieldOption::new("england", bilingual("England", "Lloegr")),
                        FieldOption::new(
                            "northern-ireland",
                            bilingual("Northern Ireland", "Gogledd Iwerddon"),
                        ),
                        FieldOption::new("scotland", bilingual("Scotland", "Yr Alban")),
                        FieldOption::new("wales", bilingual("Wales", "Cymru")),
                    ])
                    .build(),
            ),
        )
        .step(
            StepDefinition::new(bilingual("Project location", "Lleoliad y prosiect"))
                .field(location),
        )
        .step(
            StepDefinition::new(bilingual("Your idea", "Eich syniad"))
                .field(
                    FieldDefinition::builder(
                        "yourIdeaProject",
                        FieldKind::Textarea {
                            min_words: Some(50),
                            max_words: 300,
                        },
                    )
                    .label(bilingual("What would you like to do?", "Beth hoffech ei wneud?"))
                    .build(),
                )
                .field(
                    FieldDefinition::builder(
                        "yourIdeaCommunity",
                        FieldKind::Textarea {
                            min_words: Some(50),
                            max_words: 150,
                        },
                    )
                    .label(bilingual(
                        "How does your project involve your community?",
                        "Sut mae eich prosiect yn cynnwys eich cymuned?",
                    ))
                    .build(),
                ),
        )
}

fn beneficiaries() -> SectionDefinition {
    let targets_groups = Condition::field_equals("beneficiariesGroupsCheck", "yes");

    let groups = FieldDefinition::builder("beneficiariesGroups", FieldKind::Checkbox)
        .label(bilingual(
            "What specific groups is your project aimed at?",
            "At ba grwpiau penodol mae eich prosiect wedi'i anelu?",
        ))
        .options([
            FieldOption::new(
                "ethnic-background",
                "People from a particular ethnic background",
            ),
            FieldOption::new("gender", "People of a particular gender"),
            FieldOption::new("age", "People of a particular age"),
            FieldOption::new("disabled-people", "Disabled people"),
            FieldOption::new("religion", "People with a particular religious belief"),
            FieldOption::new("lgbt", "Lesbian, gay, or bisexual people"),
            FieldOption::new(
                "welsh-speakers",
                bilingual("Welsh speakers", "Siaradwyr Cymraeg"),
            )
            .show_when(country_is("wales")),
        ])
        .build();

    let welsh_language = FieldDefinition::builder("beneficiariesWelshLanguage", FieldKind::Radio)
        .label(bilingual(
            "How many of the people who will benefit speak Welsh?",
            "Faint o'r bobl a fydd yn elwa sy'n siarad Cymraeg?",
        ))
        .options([
            FieldOption::new("all", bilingual("All", "Pawb")),
            FieldOption::new(
                "more-than-half",
                bilingual("More than half", "Mwy na hanner"),
            ),
            FieldOption::new(
                "less-than-half",
                bilingual("Less than half", "Llai na hanner"),
            ),
        ])
        .build();

    let community =
        FieldDefinition::builder("beneficiariesNorthernIrelandCommunity", FieldKind::Radio)
            .label("Which community do the people who will benefit come from?")
            .options([
                FieldOption::new(
                    "both-catholic-and-protestant",
                    "Both Catholic and Protestant",
                ),
                FieldOption::new("mainly-catholic", "Mainly Catholic"),
                FieldOption::new("mainly-protestant", "Mainly Protestant"),
                FieldOption::new("neither", "Neither Catholic nor Protestant"),
            ])
            .build();

    let title = bilingual("Who will benefit", "Pwy fydd yn elwa");
    SectionDefinition::new("beneficiaries", title)
        .step(
            StepDefinition::new(bilingual("Specific groups", "Grwpiau penodol")).field(
                FieldDefinition::builder("beneficiariesGroupsCheck", FieldKind::Radio)
                    .label(bilingual(
                        "Is your project aimed at a specific group of people?",
                        "A yw eich prosiect wedi'i anelu at grŵp penodol o bobl?",
                    ))
                    .options([
                        FieldOption::new("yes", bilingual("Yes", "Ydy")),
                        FieldOption::new("no", bilingual("No", "Nac ydy")),
                    ])
                    .build(),
            ),
        )
        .step(
            StepDefinition::new(bilingual("Groups", "Grwpiau"))
                .field(groups)
                .when(targets_groups),
        )
        .step(
            StepDefinition::new(bilingual("Welsh language", "Yr iaith Gymraeg"))
                .field(welsh_language)
                .when(country_is("wales")),
        )
        .step(
            StepDefinition::new("Community")
                .field(community)
                .when(country_is("northern-ireland")),
        )
}

fn organisation() -> SectionDefinition {
    let charity_types = Condition::field_in(
        "organisationType",
        &[
            "unincorporated-registered-charity",
            "charitable-incorporated-organisation",
        ],
    );

    let established = MonthYearConstraints::default()
        .past_date()
        .min_time_ago(Offset::new(15, TimeUnit::Months));

    let organisation_type = FieldDefinition::builder("organisationType", FieldKind::Radio)
        .label("What type of organisation are you?")
        .options([
            FieldOption::new(
                "unregistered-vco",
                "Unregistered voluntary or community organisation",
            ),
            FieldOption::new(
                "unincorporated-registered-charity",
                "Registered charity (unincorporated)",
            ),
            FieldOption::new(
                "charitable-incorporated-organisation",
                "Charitable incorporated organisation (CIO)",
            ),
            FieldOption::new("not-for-profit-company", "Not-for-profit company"),
            FieldOption::new("school", "School"),
            FieldOption::new("statutory-body", "Statutory body")
                .explanation("For example a town council, parish council, or health body"),
        ])
        .build();

    let trading_name = short_text("organisationTradingName")
        .label("Does your organisation use a different name in your day-to-day work?")
        .optional()
        .build();

    let title = bilingual("Your organisation", "Eich sefydliad");
    SectionDefinition::new("organisation", title)
        .step(
            StepDefinition::new(bilingual("Organisation details", "Manylion y sefydliad"))
                .field(text(
                    "organisationLegalName",
                    bilingual(
                        "What is the full legal name of your organisation?",
                        "Beth yw enw cyfreithiol llawn eich sefydliad?",
                    ),
                ))
                .field(trading_name)
                .field(
                    FieldDefinition::builder(
                        "organisationStartDate",
                        FieldKind::MonthYear(established),
                    )
                    .label("When was your organisation set up?")
                    .message(
                        ErrorKind::DateTooRecent,
                        "Your organisation must have been running for at least {amount}",
                    )
                    .build(),
                )
                .field(
                    FieldDefinition::builder("organisationAddress", FieldKind::Address)
                        .label(bilingual(
                            "What is the main or registered address of your organisation?",
                            "Beth yw prif gyfeiriad neu gyfeiriad cofrestredig eich sefydliad?",
                        ))
                        .build(),
                )
                .field(
                    FieldDefinition::builder("organisationWebsite", FieldKind::Url)
                        .label("Organisation website")
                        .optional()
                        .build(),
                ),
        )
        .step(
            StepDefinition::new(bilingual("Organisation type", "Math o sefydliad"))
                .field(organisation_type),
        )
        .step(
            StepDefinition::new("Registration numbers")
                .field(text(
                    "charityNumber",
                    LocalizedText::new("Charity registration number"),
                ))
                .when(charity_types),
        )
        .step(
            StepDefinition::new(bilingual("Organisation finances", "Cyllid y sefydliad"))
                .field(
                    FieldDefinition::builder("accountingYearDate", FieldKind::DayMonth)
                        .label("What is your accounting year end date?")
                        .build(),
                )
                .field(
                    FieldDefinition::builder(
                        "totalIncomeYear",
                        FieldKind::Currency {
                            min: Some(0),
                            max: None,
                        },
                    )
                    .label("What is your total income for the year?")
                    .build(),
                ),
        )
}

fn contact_section(prefix: &str, slug: &str, title: LocalizedText) -> SectionDefinition {
    let name = |suffix: &str| format!("{prefix}{suffix}");
    let adult = DateLimit::BeforeToday(Offset::new(18, TimeUnit::Years));

    let full_name = FieldDefinition::builder(name("Name"), FieldKind::Name)
        .label(bilingual("Full name", "Enw llawn"))
        .build();
    let date_of_birth = FieldDefinition::builder(
        name("DateOfBirth"),
        FieldKind::Date(DateConstraints::default().max(adult)),
    )
    .label(bilingual("Date of birth", "Dyddiad geni"))
    .message(
        ErrorKind::DateAfterMaximum,
        "Contact must be at least 18 years old",
    )
    .build();
    let address = FieldDefinition::builder(name("Address"), FieldKind::Address)
        .label(bilingual("Home address", "Cyfeiriad cartref"))
        .build();
    let email = FieldDefinition::builder(name("Email"), FieldKind::Email)
        .label(bilingual("Email", "E-bost"))
        .build();
    let phone = FieldDefinition::builder(name("Phone"), FieldKind::Phone)
        .label(bilingual("Telephone number", "Rhif ffôn"))
        .build();

    SectionDefinition::new(slug, title.clone()).step(
        StepDefinition::new(title)
            .fieldset(Fieldset::new([full_name, date_of_birth]))
            .fieldset(Fieldset::new([address]).legend(bilingual("Address", "Cyfeiriad")))
            .fieldset(
                Fieldset::new([email, phone])
                    .legend(bilingual("Contact details", "Manylion cyswllt")),
            ),
    )
}

fn budget() -> SectionDefinition {
    SectionDefinition::new("budget", bilingual("Budget", "Cyllideb"))
        .step(
            StepDefinition::new(bilingual("Project costs", "Costau'r prosiect")).field(
                FieldDefinition::builder(
                    "projectBudget",
                    FieldKind::Budget {
                        min: Some(MIN_BUDGET),
                        max: Some(MAX_BUDGET),
                        max_items: MAX_BUDGET_ITEMS,
                    },
                )
                .label(bilingual(
                    "List the costs you would like us to fund",
                    "Rhestrwch y costau yr hoffech i ni eu hariannu",
                ))
                .build(),
            ),
        )
        .step(
            StepDefinition::new(bilingual("Total costs", "Cyfanswm y costau"))
                .field(
                    FieldDefinition::builder(
                        "projectTotalCosts",
                        FieldKind::Currency {
                            min: Some(MIN_BUDGET),
                            max: None,
                        },
                    )
                    .label(bilingual(
                        "Tell us the total cost of your project",
                        "Dywedwch wrthym gyfanswm cost eich prosiect",
                    ))
                    .build(),
                )
                .field(
                    FieldDefinition::builder("projectMatchFundingPercentage", FieldKind::Percentage)
                        .label("What percentage of the total cost is covered by other funding?")
                        .optional()
                        .build(),
                ),
        )
}

fn terms() -> SectionDefinition {
    let title = bilingual("Terms and conditions", "Telerau ac amodau");
    let agreement = FieldDefinition::builder("termsAgreement", FieldKind::Checkbox)
        .label("Terms of your grant")
        .option(FieldOption::new(
            "yes",
            bilingual(
                "I have understood my organisation's responsibilities",
                "Rwyf wedi deall cyfrifoldebau fy sefydliad",
            ),
        ))
        .message(
            ErrorKind::Required,
            "You must confirm that you agree to the terms",
        )
        .build();

    SectionDefinition::new("terms-and-conditions", title.clone()).step(
        StepDefinition::new(title)
            .field(agreement)
            .field(text(
                "termsPersonName",
                bilingual("Full name of person completing this form", "Enw llawn"),
            ))
            .field(text(
                "termsPersonPosition",
                bilingual("Position in organisation", "Swydd yn y sefydliad"),
            )),
    )
}

/// Build the community grant form.
pub fn community_grant_form() -> Result<FormModel, FormDefinitionError> {
    FormModel::builder(
        COMMUNITY_GRANT_ID,
        bilingual("Community grant", "Grant cymunedol"),
    )
    .base_url(format!("/apply/{COMMUNITY_GRANT_ID}"))
    .section(your_project())
    .section(beneficiaries())
    .section(organisation())
    .section(contact_section(
        "mainContact",
        "main-contact",
        bilingual("Main contact", "Prif gyswllt"),
    ))
    .section(contact_section(
        "seniorContact",
        "senior-contact",
        bilingual("Senior contact", "Uwch gyswllt"),
    ))
    .section(budget())
    .section(terms())
    .cross_field(CrossFieldRule::DateOnOrAfter {
        field: "projectEndDate".to_string(),
        reference: "projectStartDate".to_string(),
    })
    .cross_field(CrossFieldRule::DateWithinRange {
        field: "projectEndDate".to_string(),
        reference: "projectStartDate".to_string(),
        limit: Offset::new(15, TimeUnit::Months),
    })
    .cross_field(CrossFieldRule::MustDiffer {
        field: "seniorContactName".to_string(),
        other: "mainContactName".to_string(),
    })
    .cross_field(CrossFieldRule::MustDiffer {
        field: "seniorContactAddress".to_string(),
        other: "mainContactAddress".to_string(),
    })
    .cross_field(CrossFieldRule::ProjectTotalCoversBudget {
        total_field: "projectTotalCosts".to_string(),
        budget_field: "projectBudget".to_string(),
    })
    .overview(OverviewSpec {
        title_field: "projectName".to_string(),
        country_field: Some("projectCountry".to_string()),
        overview_fields: vec![
            "projectStartDate".to_string(),
            "projectEndDate".to_string(),
            "projectTotalCosts".to_string(),
        ],
    })
    .build()
}
