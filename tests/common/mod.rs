#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};

use grant_forms::workflows::grants::{community_grant_form, FormData, FormModel};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .expect("valid time")
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub fn form() -> FormModel {
    community_grant_form().expect("catalogue builds")
}

pub fn words(count: usize) -> String {
    vec!["garden"; count].join(" ")
}

pub fn answers(overrides: Value) -> FormData {
    let mut data = json!({
        "projectName": "Leeds community garden",
        "projectStartDate": { "day": 1, "month": 10, "year": 2025 },
        "projectEndDate": { "day": 1, "month": 6, "year": 2026 },
        "projectCountry": "england",
        "projectLocationDescription": "Hyde Park, Leeds",
        "yourIdeaProject": words(60),
        "yourIdeaCommunity": words(55),
        "beneficiariesGroupsCheck": "no",
        "organisationLegalName": "Leeds Garden Club",
        "organisationStartDate": { "month": 1, "year": 2020 },
        "organisationAddress": {
            "buildingAndStreet": "1 Park Lane",
            "townCity": "Leeds",
            "postcode": "ls1 4ap"
        },
        "organisationType": "unregistered-vco",
        "accountingYearDate": { "day": 31, "month": 3 },
        "totalIncomeYear": 25000,
        "mainContactName": { "firstName": "Ann", "lastName": "Bee" },
        "mainContactDateOfBirth": { "day": 1, "month": 1, "year": 1980 },
        "mainContactAddress": {
            "buildingAndStreet": "2 Mill Road",
            "townCity": "Leeds",
            "postcode": "LS2 9JT"
        },
        "mainContactEmail": "ann@example.com",
        "mainContactPhone": "07700 900123",
        "seniorContactName": { "firstName": "Cy", "lastName": "Dee" },
        "seniorContactDateOfBirth": { "day": 5, "month": 5, "year": 1975 },
        "seniorContactAddress": {
            "buildingAndStreet": "3 Bridge Street",
            "townCity": "Leeds",
            "postcode": "LS3 1AB"
        },
        "seniorContactEmail": "cy@example.com",
        "seniorContactPhone": "0113 496 0000",
        "projectBudget": [
            { "item": "Raised beds", "cost": 1200 },
            { "item": "Tools", "cost": "450" }
        ],
        "projectTotalCosts": 2000,
        "termsAgreement": ["yes"],
        "termsPersonName": "Ann Bee",
        "termsPersonPosition": "Chair"
    });

    if let (Some(base), Value::Object(extra)) = (data.as_object_mut(), overrides) {
        base.extend(extra);
    }
    data.as_object().cloned().unwrap_or_default()
}
