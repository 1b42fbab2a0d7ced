use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use super::{value_number, value_text, ErrorKind, RuleError};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
            .expect("email pattern compiles")
    })
}

pub fn validate_text(value: &Value, max_length: Option<usize>) -> Result<Value, RuleError> {
    let text = value_text(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidType))?;
    if let Some(max) = max_length {
        if text.chars().count() > max {
            return Err(RuleError::new(ErrorKind::TooLong).with_param("max", max));
        }
    }
    Ok(Value::String(text))
}

pub fn validate_email(value: &Value) -> Result<Value, RuleError> {
    let text = value_text(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidType))?;
    if email_pattern().is_match(&text) {
        Ok(Value::String(text))
    } else {
        Err(RuleError::new(ErrorKind::InvalidEmail))
    }
}

/// Accepts http(s) URLs, assuming `https://` when the scheme is left off.
pub fn validate_url(value: &Value) -> Result<Value, RuleError> {
    let text = value_text(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidType))?;
    let candidate = if text.contains("://") {
        text
    } else {
        format!("https://{text}")
    };

    let parsed = Url::parse(&candidate).map_err(|_| RuleError::new(ErrorKind::InvalidUrl))?;
    let has_dotted_host = parsed
        .host_str()
        .map(|host| host.contains('.') && !host.ends_with('.'))
        .unwrap_or(false);
    if !matches!(parsed.scheme(), "http" | "https") || !has_dotted_host {
        return Err(RuleError::new(ErrorKind::InvalidUrl));
    }
    Ok(Value::String(candidate))
}

pub fn validate_number(
    value: &Value,
    min: Option<f64>,
    max: Option<f64>,
    integer: bool,
) -> Result<Value, RuleError> {
    let number = value_number(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidNumber))?;
    if integer && number.fract() != 0.0 {
        return Err(RuleError::new(ErrorKind::InvalidNumber));
    }
    if let Some(min) = min {
        if number < min {
            return Err(RuleError::new(ErrorKind::NumberBelowMinimum).with_param("min", min));
        }
    }
    if let Some(max) = max {
        if number > max {
            return Err(RuleError::new(ErrorKind::NumberAboveMaximum).with_param("max", max));
        }
    }

    let normalized = if integer {
        // `as` saturates, so anything outside i64 is rejected first.
        if number >= i64::MAX as f64 {
            return Err(RuleError::new(ErrorKind::NumberAboveMaximum).with_param("max", i64::MAX));
        }
        if number < i64::MIN as f64 {
            return Err(RuleError::new(ErrorKind::NumberBelowMinimum).with_param("min", i64::MIN));
        }
        serde_json::Number::from(number as i64)
    } else {
        serde_json::Number::from_f64(number)
            .ok_or_else(|| RuleError::new(ErrorKind::InvalidNumber))?
    };
    Ok(Value::Number(normalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_requires_domain_with_dot() {
        assert_eq!(
            validate_email(&json!(" grants@example.org ")),
            Ok(json!("grants@example.org"))
        );
        assert_eq!(
            validate_email(&json!("grants@localhost")).map_err(|err| err.kind),
            Err(ErrorKind::InvalidEmail)
        );
    }

    #[test]
    fn url_adds_missing_scheme() {
        assert_eq!(
            validate_url(&json!("example.org/about")),
            Ok(json!("https://example.org/about"))
        );
        assert_eq!(
            validate_url(&json!("ftp://example.org")).map_err(|err| err.kind),
            Err(ErrorKind::InvalidUrl)
        );
        assert_eq!(
            validate_url(&json!("not a url")).map_err(|err| err.kind),
            Err(ErrorKind::InvalidUrl)
        );
    }

    #[test]
    fn number_bounds_and_coercion() {
        assert_eq!(
            validate_number(&json!("1,250"), Some(0.0), None, true),
            Ok(json!(1250))
        );
        assert_eq!(
            validate_number(&json!(101), None, Some(100.0), false).map_err(|err| err.kind),
            Err(ErrorKind::NumberAboveMaximum)
        );
        assert_eq!(
            validate_number(&json!("12.5"), None, None, true).map_err(|err| err.kind),
            Err(ErrorKind::InvalidNumber)
        );
    }

    #[test]
    fn integers_beyond_i64_are_rejected() {
        assert_eq!(
            validate_number(&json!(1e20), Some(0.0), None, true).map_err(|err| err.kind),
            Err(ErrorKind::NumberAboveMaximum)
        );
        assert_eq!(
            validate_number(&json!(-1e20), None, None, true).map_err(|err| err.kind),
            Err(ErrorKind::NumberBelowMinimum)
        );
        assert_eq!(
            validate_number(&json!(1e15), None, None, true),
            Ok(json!(1_000_000_000_000_000_i64))
        );
    }

    #[test]
    fn text_enforces_character_limit() {
        let err = validate_text(&json!("abcdef"), Some(5)).expect_err("too long");
        assert_eq!(err.kind, ErrorKind::TooLong);
        assert_eq!(err.params.get("max").map(String::as_str), Some("5"));
    }
}
