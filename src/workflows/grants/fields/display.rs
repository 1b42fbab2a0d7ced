use chrono::Datelike;
use serde_json::Value;

use super::{FieldDefinition, FieldKind};
use crate::workflows::grants::locale::{month_name, total_label, Locale};
use crate::workflows::grants::rules::{
    is_empty_value, member_text, parse_date_parts, parse_day_month, parse_month_year,
    value_number, value_text,
};

/// Group thousands with commas and keep up to two decimal places.
pub fn format_number(number: f64) -> String {
    let negative = number < 0.0;
    let rounded = (number.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let fraction = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative && (whole > 0 || fraction > 0) { "-" } else { "" };
    match fraction {
        0 => format!("{sign}{grouped}"),
        f if f.is_multiple_of(10) => format!("{sign}{grouped}.{}", f / 10),
        f => format!("{sign}{grouped}.{f:02}"),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(super) fn display_value(field: &FieldDefinition, value: &Value, locale: Locale) -> String {
    if is_empty_value(value) {
        return String::new();
    }

    match field.kind() {
        FieldKind::Text { .. }
        | FieldKind::Email
        | FieldKind::Phone
        | FieldKind::Url
        | FieldKind::Textarea { .. } => plain(value),
        FieldKind::Name => ["firstName", "lastName"]
            .iter()
            .filter_map(|key| member_text(value, key))
            .collect::<Vec<_>>()
            .join(" "),
        FieldKind::Currency { .. } => value_number(value)
            .map(|number| format!("£{}", format_number(number)))
            .unwrap_or_else(|| plain(value)),
        FieldKind::Percentage => value_number(value)
            .map(|number| format!("{}%", format_number(number)))
            .unwrap_or_else(|| plain(value)),
        FieldKind::Budget { .. } => budget_lines(value, locale),
        FieldKind::Date(_) => parse_date_parts(value)
            .and_then(|date| {
                month_name(locale, date.month())
                    .map(|month| format!("{} {}, {}", date.day(), month, date.year()))
            })
            .unwrap_or_default(),
        FieldKind::DayMonth => parse_day_month(value)
            .and_then(|(day, month)| month_name(locale, month).map(|name| format!("{day} {name}")))
            .unwrap_or_default(),
        FieldKind::MonthYear(_) => parse_month_year(value)
            .and_then(|date| {
                month_name(locale, date.month()).map(|name| format!("{} {}", name, date.year()))
            })
            .unwrap_or_default(),
        FieldKind::Radio | FieldKind::Checkbox => choice_labels(field, value, locale),
        FieldKind::Address => ["buildingAndStreet", "townCity", "county", "postcode"]
            .iter()
            .filter_map(|key| member_text(value, key))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn budget_lines(value: &Value, locale: Locale) -> String {
    let Some(rows) = value.as_array() else {
        return plain(value);
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let mut total = 0.0;
    for row in rows {
        let item = row.get("item").and_then(value_text).unwrap_or_default();
        let cost = row.get("cost").and_then(value_number);
        if item.is_empty() && cost.is_none() {
            continue;
        }
        let cost = cost.unwrap_or(0.0);
        total += cost;
        lines.push(format!("{} – £{}", item, format_number(cost)));
    }
    lines.push(format!("{}: £{}", total_label(locale), format_number(total)));
    lines.join("\n")
}

fn choice_labels(field: &FieldDefinition, value: &Value, locale: Locale) -> String {
    let label_for = |selected: &str| {
        field
            .options()
            .iter()
            .find(|option| option.value == selected)
            .map(|option| option.label.localize(locale))
            .unwrap_or_else(|| selected.to_string())
    };

    match value {
        Value::String(selected) => label_for(selected),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(label_for)
            .collect::<Vec<_>>()
            .join(", "),
        other => plain(other),
    }
}
