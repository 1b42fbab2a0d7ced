use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};

use super::{value_number, ErrorKind, Offset, RuleError, ValidationContext};

/// A bound resolved against the request's "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLimit {
    Fixed(NaiveDate),
    Today,
    AfterToday(Offset),
    BeforeToday(Offset),
}

impl DateLimit {
    pub fn resolve(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            DateLimit::Fixed(date) => Some(date),
            DateLimit::Today => Some(today),
            DateLimit::AfterToday(offset) => offset.add_to(today),
            DateLimit::BeforeToday(offset) => offset.subtract_from(today),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateConstraints {
    pub min: Option<DateLimit>,
    pub max: Option<DateLimit>,
}

impl DateConstraints {
    pub fn min(mut self, limit: DateLimit) -> Self {
        self.min = Some(limit);
        self
    }

    pub fn max(mut self, limit: DateLimit) -> Self {
        self.max = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthYearConstraints {
    pub past_date: bool,
    pub min_time_ago: Option<Offset>,
}

impl MonthYearConstraints {
    pub fn past_date(mut self) -> Self {
        self.past_date = true;
        self
    }

    pub fn min_time_ago(mut self, offset: Offset) -> Self {
        self.min_time_ago = Some(offset);
        self
    }
}

fn part(value: &Value, key: &str) -> Option<u32> {
    let number = value_number(value.get(key)?)?;
    if number.fract() != 0.0 || number < 0.0 || number > f64::from(u32::MAX) {
        return None;
    }
    Some(number as u32)
}

fn year_part(value: &Value) -> Option<i32> {
    part(value, "year")
        .filter(|year| (1000..=9999).contains(year))
        .and_then(|year| i32::try_from(year).ok())
}

/// `{day, month, year}` as a calendar date; `None` for impossible dates like 31 February.
pub fn parse_date_parts(value: &Value) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        year_part(value)?,
        part(value, "month")?,
        part(value, "day")?,
    )
}

/// `{day, month}` checked against a leap year so 29 February is allowed.
pub fn parse_day_month(value: &Value) -> Option<(u32, u32)> {
    let day = part(value, "day")?;
    let month = part(value, "month")?;
    NaiveDate::from_ymd_opt(2000, month, day).map(|_| (day, month))
}

/// `{month, year}` as the first day of that month.
pub fn parse_month_year(value: &Value) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year_part(value)?, part(value, "month")?, 1)
}

fn date_value(date: NaiveDate) -> Value {
    json!({ "day": date.day(), "month": date.month(), "year": date.year() })
}

pub fn validate_date_parts(
    value: &Value,
    constraints: &DateConstraints,
    ctx: &ValidationContext<'_>,
) -> Result<Value, RuleError> {
    let date = parse_date_parts(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidDate))?;

    if let Some(min) = constraints.min.and_then(|limit| limit.resolve(ctx.today)) {
        if date < min {
            return Err(RuleError::new(ErrorKind::DateBeforeMinimum).with_param("min", min));
        }
    }
    if let Some(max) = constraints.max.and_then(|limit| limit.resolve(ctx.today)) {
        if date > max {
            return Err(RuleError::new(ErrorKind::DateAfterMaximum).with_param("max", max));
        }
    }

    Ok(date_value(date))
}

pub fn validate_day_month(value: &Value) -> Result<Value, RuleError> {
    let (day, month) =
        parse_day_month(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidDate))?;
    Ok(json!({ "day": day, "month": month }))
}

pub fn validate_month_year(
    value: &Value,
    constraints: &MonthYearConstraints,
    ctx: &ValidationContext<'_>,
) -> Result<Value, RuleError> {
    let date = parse_month_year(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidDate))?;

    if constraints.past_date && date > ctx.today {
        return Err(RuleError::new(ErrorKind::DateNotInPast));
    }
    if let Some(offset) = constraints.min_time_ago {
        let latest = offset
            .subtract_from(ctx.today)
            .ok_or_else(|| RuleError::new(ErrorKind::InvalidDate))?;
        if date > latest {
            return Err(
                RuleError::new(ErrorKind::DateTooRecent).with_param("amount", offset.label())
            );
        }
    }

    Ok(json!({ "month": date.month(), "year": date.year() }))
}

/// `value` must not fall before `reference`. Unparseable references are left to their own
/// field's validation.
pub fn date_on_or_after(value: &Value, reference: &Value) -> Result<(), RuleError> {
    match (parse_date_parts(value), parse_date_parts(reference)) {
        (Some(date), Some(reference)) if date < reference => Err(RuleError::new(
            ErrorKind::DateBeforeReference,
        )
        .with_param("reference", reference)),
        _ => Ok(()),
    }
}

/// `value` must not be later than `reference + limit`.
pub fn date_within_range(value: &Value, reference: &Value, limit: Offset) -> Result<(), RuleError> {
    let (Some(date), Some(reference)) = (parse_date_parts(value), parse_date_parts(reference))
    else {
        return Ok(());
    };
    match limit.add_to(reference) {
        Some(latest) if date <= latest => Ok(()),
        _ => Err(RuleError::new(ErrorKind::DateOutsideRange).with_param("limit", limit.label())),
    }
}
