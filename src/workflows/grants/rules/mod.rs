//! Reusable constraint rules shared by every field variant.
//!
//! A field's schema is an ordered list of [`Rule`]s. Each rule either rejects the value with a
//! [`RuleError`] or hands a (possibly coerced) value to the next rule, so trimming, phone
//! canonicalisation, and budget row pruning are visible to everything downstream.

mod budget;
mod compare;
mod dates;
mod formats;
mod phone;
mod postcode;
mod words;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use budget::{
    budget_total, project_total_covers_budget, validate_budget_items, validate_budget_range,
};
pub use compare::{compare_object, normalized_values};
pub use dates::{
    date_on_or_after, date_within_range, parse_date_parts, parse_day_month, parse_month_year,
    validate_date_parts, validate_day_month, validate_month_year, DateConstraints, DateLimit,
    MonthYearConstraints,
};
pub use formats::{validate_email, validate_number, validate_text, validate_url};
pub use phone::{format_uk_phone, validate_phone};
pub use postcode::{normalize_postcode, validate_postcode, AddressLookup, LookupError};
pub use words::{validate_word_count, word_count};

/// Every constraint a rule can report. Codes are stable and used as message keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Required,
    InvalidType,
    TooLong,
    InvalidEmail,
    InvalidPhone,
    InvalidUrl,
    InvalidPostcode,
    InvalidNumber,
    NumberBelowMinimum,
    NumberAboveMaximum,
    InvalidOption,
    IncompleteName,
    IncompleteAddress,
    InvalidDate,
    DateBeforeMinimum,
    DateAfterMaximum,
    DateNotInPast,
    DateTooRecent,
    DateBeforeReference,
    DateOutsideRange,
    TooFewWords,
    TooManyWords,
    BudgetItemMissing,
    BudgetCostMissing,
    TooManyBudgetItems,
    UnderBudget,
    OverBudget,
    UnderProjectBudgetTotal,
    ObjectsMustNotMatch,
}

/// Coarse error taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    FieldRequired,
    FieldInvalidFormat,
    CrossFieldConstraintViolated,
    WordCountOutOfRange,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidType => "invalid_type",
            Self::TooLong => "too_long",
            Self::InvalidEmail => "invalid_email",
            Self::InvalidPhone => "invalid_phone",
            Self::InvalidUrl => "invalid_url",
            Self::InvalidPostcode => "invalid_postcode",
            Self::InvalidNumber => "invalid_number",
            Self::NumberBelowMinimum => "number_below_minimum",
            Self::NumberAboveMaximum => "number_above_maximum",
            Self::InvalidOption => "invalid_option",
            Self::IncompleteName => "incomplete_name",
            Self::IncompleteAddress => "incomplete_address",
            Self::InvalidDate => "invalid_date",
            Self::DateBeforeMinimum => "date_before_minimum",
            Self::DateAfterMaximum => "date_after_maximum",
            Self::DateNotInPast => "date_not_in_past",
            Self::DateTooRecent => "date_too_recent",
            Self::DateBeforeReference => "date_before_reference",
            Self::DateOutsideRange => "date_outside_range",
            Self::TooFewWords => "too_few_words",
            Self::TooManyWords => "too_many_words",
            Self::BudgetItemMissing => "budget_item_missing",
            Self::BudgetCostMissing => "budget_cost_missing",
            Self::TooManyBudgetItems => "too_many_budget_items",
            Self::UnderBudget => "under_budget",
            Self::OverBudget => "over_budget",
            Self::UnderProjectBudgetTotal => "under_project_budget_total",
            Self::ObjectsMustNotMatch => "objects_must_not_match",
        }
    }

    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::Required => ErrorCategory::FieldRequired,
            Self::TooFewWords | Self::TooManyWords => ErrorCategory::WordCountOutOfRange,
            Self::DateBeforeReference
            | Self::DateOutsideRange
            | Self::UnderBudget
            | Self::OverBudget
            | Self::UnderProjectBudgetTotal
            | Self::ObjectsMustNotMatch => ErrorCategory::CrossFieldConstraintViolated,
            _ => ErrorCategory::FieldInvalidFormat,
        }
    }
}

/// A failed constraint. `path` points inside structured values (e.g. `1.cost` for a budget
/// row) and `params` feed message placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleError {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl RuleError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            params: BTreeMap::new(),
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} at {}", self.kind.code(), path),
            None => f.write_str(self.kind.code()),
        }
    }
}

impl std::error::Error for RuleError {}

/// Request-scoped inputs rules may consult.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub today: NaiveDate,
    pub address_lookup: Option<&'a dyn AddressLookup>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            address_lookup: None,
        }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn with_address_lookup(mut self, lookup: &'a dyn AddressLookup) -> Self {
        self.address_lookup = Some(lookup);
        self
    }
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("today", &self.today)
            .field("address_lookup", &self.address_lookup.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Days,
    Weeks,
    Months,
    Years,
}

/// A calendar distance such as "15 months" or "1 year".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub amount: u32,
    pub unit: TimeUnit,
}

impl Offset {
    pub const fn new(amount: u32, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    pub fn add_to(self, date: NaiveDate) -> Option<NaiveDate> {
        match self.unit {
            TimeUnit::Days => date.checked_add_signed(Duration::days(i64::from(self.amount))),
            TimeUnit::Weeks => date.checked_add_signed(Duration::weeks(i64::from(self.amount))),
            TimeUnit::Months => date.checked_add_months(Months::new(self.amount)),
            TimeUnit::Years => date.checked_add_months(Months::new(self.amount.checked_mul(12)?)),
        }
    }

    pub fn subtract_from(self, date: NaiveDate) -> Option<NaiveDate> {
        match self.unit {
            TimeUnit::Days => date.checked_sub_signed(Duration::days(i64::from(self.amount))),
            TimeUnit::Weeks => date.checked_sub_signed(Duration::weeks(i64::from(self.amount))),
            TimeUnit::Months => date.checked_sub_months(Months::new(self.amount)),
            TimeUnit::Years => date.checked_sub_months(Months::new(self.amount.checked_mul(12)?)),
        }
    }

    pub fn label(self) -> String {
        let unit = match (self.unit, self.amount) {
            (TimeUnit::Days, 1) => "day",
            (TimeUnit::Days, _) => "days",
            (TimeUnit::Weeks, 1) => "week",
            (TimeUnit::Weeks, _) => "weeks",
            (TimeUnit::Months, 1) => "month",
            (TimeUnit::Months, _) => "months",
            (TimeUnit::Years, 1) => "year",
            (TimeUnit::Years, _) => "years",
        };
        format!("{} {}", self.amount, unit)
    }
}

/// One node of a field's validation tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Text { max_length: Option<usize> },
    Email,
    Phone,
    Url,
    Postcode,
    Number {
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    },
    WordCount {
        min: Option<usize>,
        max: Option<usize>,
    },
    DateParts(DateConstraints),
    DayMonth,
    MonthYear(MonthYearConstraints),
    Choice { values: Vec<String>, multiple: bool },
    Name,
    Address,
    BudgetItems { max_items: Option<usize> },
    BudgetRange { min: Option<u64>, max: Option<u64> },
}

impl Rule {
    pub fn apply(&self, value: Value, ctx: &ValidationContext<'_>) -> Result<Value, RuleError> {
        match self {
            Rule::Text { max_length } => validate_text(&value, *max_length),
            Rule::Email => validate_email(&value),
            Rule::Phone => validate_phone(&value),
            Rule::Url => validate_url(&value),
            Rule::Postcode => validate_postcode(&value, ctx),
            Rule::Number { min, max, integer } => validate_number(&value, *min, *max, *integer),
            Rule::WordCount { min, max } => validate_word_count(&value, *min, *max),
            Rule::DateParts(constraints) => validate_date_parts(&value, constraints, ctx),
            Rule::DayMonth => validate_day_month(&value),
            Rule::MonthYear(constraints) => validate_month_year(&value, constraints, ctx),
            Rule::Choice { values, multiple } => validate_choice(&value, values, *multiple),
            Rule::Name => validate_name(&value),
            Rule::Address => validate_address(&value, ctx),
            Rule::BudgetItems { max_items } => validate_budget_items(&value, *max_items),
            Rule::BudgetRange { min, max } => validate_budget_range(&value, *min, *max),
        }
    }
}

/// Ordered rule pipeline built once per field definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    rules: Vec<Rule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn apply(&self, value: &Value, ctx: &ValidationContext<'_>) -> Result<Value, RuleError> {
        self.rules
            .iter()
            .try_fold(value.clone(), |current, rule| rule.apply(current, ctx))
    }
}

/// Whether a value counts as "not answered". Objects are empty when every member is.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_empty_value),
        Value::Object(members) => members.values().all(is_empty_value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let cleaned: String = text
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '£' | '%' | ' '))
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                cleaned
                    .parse::<f64>()
                    .ok()
                    .filter(|number| number.is_finite())
            }
        }
        _ => None,
    }
}

pub(crate) fn member_text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(value_text)
        .filter(|text| !text.is_empty())
}

fn validate_choice(value: &Value, values: &[String], multiple: bool) -> Result<Value, RuleError> {
    let known = |candidate: &Value| {
        candidate
            .as_str()
            .map(|text| values.iter().any(|value| value == text))
            .unwrap_or(false)
    };

    match value {
        Value::String(_) if known(value) => {
            if multiple {
                Ok(Value::Array(vec![value.clone()]))
            } else {
                Ok(value.clone())
            }
        }
        Value::Array(items) if multiple => {
            if items.iter().all(known) {
                Ok(value.clone())
            } else {
                Err(RuleError::new(ErrorKind::InvalidOption))
            }
        }
        Value::String(_) => Err(RuleError::new(ErrorKind::InvalidOption)),
        _ => Err(RuleError::new(ErrorKind::InvalidType)),
    }
}

fn validate_name(value: &Value) -> Result<Value, RuleError> {
    if !value.is_object() {
        return Err(RuleError::new(ErrorKind::InvalidType));
    }
    for part in ["firstName", "lastName"] {
        if member_text(value, part).is_none() {
            return Err(RuleError::new(ErrorKind::IncompleteName).at(part));
        }
    }
    Ok(trim_members(value))
}

fn validate_address(value: &Value, ctx: &ValidationContext<'_>) -> Result<Value, RuleError> {
    if !value.is_object() {
        return Err(RuleError::new(ErrorKind::InvalidType));
    }
    for part in ["buildingAndStreet", "townCity", "postcode"] {
        if member_text(value, part).is_none() {
            return Err(RuleError::new(ErrorKind::IncompleteAddress).at(part));
        }
    }

    let mut address = trim_members(value);
    if let Some(postcode) = address.get("postcode").cloned() {
        let normalized = validate_postcode(&postcode, ctx).map_err(|err| err.at("postcode"))?;
        if let Some(members) = address.as_object_mut() {
            members.insert("postcode".to_string(), normalized);
        }
    }
    Ok(address)
}

fn trim_members(value: &Value) -> Value {
    match value {
        Value::Object(members) => Value::Object(
            members
                .iter()
                .map(|(key, member)| {
                    let trimmed = match member {
                        Value::String(text) => Value::String(text.trim().to_string()),
                        other => other.clone(),
                    };
                    (key.clone(), trimmed)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ValidationContext<'static> {
        ValidationContext::new(NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"))
    }

    #[test]
    fn schema_threads_coerced_values_through_rules() {
        let schema = Schema::new()
            .rule(Rule::Text {
                max_length: Some(20),
            })
            .rule(Rule::Postcode);
        let value = schema
            .apply(&json!("  sw1a1aa "), &ctx())
            .expect("valid postcode");
        assert_eq!(value, json!("SW1A 1AA"));
    }

    #[test]
    fn empty_detection_covers_nested_values() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("   ")));
        assert!(is_empty_value(&json!({ "day": "", "month": null })));
        assert!(is_empty_value(&json!([{ "item": "", "cost": "" }])));
        assert!(!is_empty_value(&json!({ "day": "1" })));
        assert!(!is_empty_value(&json!(0)));
    }

    #[test]
    fn choice_rejects_unknown_values() {
        let rule = Rule::Choice {
            values: vec!["yes".to_string(), "no".to_string()],
            multiple: false,
        };
        assert_eq!(rule.apply(json!("yes"), &ctx()), Ok(json!("yes")));
        assert_eq!(
            rule.apply(json!("maybe"), &ctx()).map_err(|err| err.kind),
            Err(ErrorKind::InvalidOption)
        );
    }

    #[test]
    fn checkbox_choice_wraps_single_selection() {
        let rule = Rule::Choice {
            values: vec!["a".to_string(), "b".to_string()],
            multiple: true,
        };
        assert_eq!(rule.apply(json!("a"), &ctx()), Ok(json!(["a"])));
        assert_eq!(rule.apply(json!(["a", "b"]), &ctx()), Ok(json!(["a", "b"])));
        assert_eq!(
            rule.apply(json!(["a", "z"]), &ctx())
                .map_err(|err| err.kind),
            Err(ErrorKind::InvalidOption)
        );
    }

    #[test]
    fn address_requires_core_lines_and_normalizes_postcode() {
        let value = json!({
            "buildingAndStreet": " 1 High Street ",
            "townCity": "Cardiff",
            "county": "",
            "postcode": "cf10 1aa"
        });
        let address = Rule::Address.apply(value, &ctx()).expect("valid address");
        assert_eq!(address["buildingAndStreet"], json!("1 High Street"));
        assert_eq!(address["postcode"], json!("CF10 1AA"));

        let missing_town = json!({ "buildingAndStreet": "1 High Street", "postcode": "CF10 1AA" });
        let err = Rule::Address
            .apply(missing_town, &ctx())
            .expect_err("town required");
        assert_eq!(err.kind, ErrorKind::IncompleteAddress);
        assert_eq!(err.path.as_deref(), Some("townCity"));
    }

    #[test]
    fn categories_follow_taxonomy() {
        assert_eq!(ErrorKind::Required.category(), ErrorCategory::FieldRequired);
        assert_eq!(
            ErrorKind::InvalidPhone.category(),
            ErrorCategory::FieldInvalidFormat
        );
        assert_eq!(
            ErrorKind::ObjectsMustNotMatch.category(),
            ErrorCategory::CrossFieldConstraintViolated
        );
        assert_eq!(
            ErrorKind::TooManyWords.category(),
            ErrorCategory::WordCountOutOfRange
        );
    }

    #[test]
    fn offsets_handle_calendar_units() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date");
        assert_eq!(
            Offset::new(1, TimeUnit::Months).add_to(start),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            Offset::new(1, TimeUnit::Years).subtract_from(start),
            NaiveDate::from_ymd_opt(2023, 1, 31)
        );
        assert_eq!(Offset::new(15, TimeUnit::Months).label(), "15 months");
    }
}
