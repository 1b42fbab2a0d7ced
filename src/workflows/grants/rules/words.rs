use serde_json::Value;

use super::{value_text, ErrorKind, RuleError};

/// Number of runs of non-whitespace characters. Every word counter shown to applicants
/// goes through this function so limits and counters agree.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn validate_word_count(
    value: &Value,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<Value, RuleError> {
    let text = value_text(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidType))?;
    let count = word_count(&text);

    if let Some(min) = min {
        if count < min {
            return Err(RuleError::new(ErrorKind::TooFewWords)
                .with_param("min", min)
                .with_param("count", count));
        }
    }
    if let Some(max) = max {
        if count > max {
            return Err(RuleError::new(ErrorKind::TooManyWords)
                .with_param("max", max)
                .with_param("count", count));
        }
    }
    Ok(Value::String(text))
}
