use serde_json::Value;

use super::{ErrorKind, RuleError};

/// Every scalar inside `value`, trimmed, lowercased, and sorted.
pub fn normalized_values(value: &Value) -> Vec<String> {
    let mut values = Vec::new();
    collect(value, &mut values);
    values.sort();
    values
}

fn collect(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(members) => members.values().for_each(|member| collect(member, out)),
        Value::Array(items) => items.iter().for_each(|item| collect(item, out)),
        Value::String(text) => out.push(text.trim().to_lowercase()),
        Value::Number(number) => out.push(number.to_string()),
        Value::Bool(flag) => out.push(flag.to_string()),
        Value::Null => {}
    }
}

/// Fails when two object-valued answers hold the same values once normalized, e.g. the
/// senior and main contact being the same person.
pub fn compare_object(value: &Value, other: &Value) -> Result<(), RuleError> {
    let left = normalized_values(value);
    if left.is_empty() {
        return Ok(());
    }
    if left == normalized_values(other) {
        Err(RuleError::new(ErrorKind::ObjectsMustNotMatch))
    } else {
        Ok(())
    }
}
