use serde_json::Value;
use tracing::debug;

use super::{value_text, ErrorKind, RuleError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum PhoneParseError {
    #[error("contains characters other than digits and separators")]
    InvalidCharacters,
    #[error("country code is not +44")]
    ForeignNumber,
    #[error("national number must have ten digits, found {0}")]
    WrongLength(usize),
    #[error("unallocated number range starting {0}")]
    UnallocatedRange(char),
}

/// Parse a UK number and render it in national format, e.g. `07700 900123`, `020 7946 0000`.
pub fn format_uk_phone(raw: &str) -> Option<String> {
    match parse_national_number(raw) {
        Ok(national) => Some(format_national(&national)),
        Err(err) => {
            debug!(error = %err, "phone number rejected");
            None
        }
    }
}

/// Any parse failure becomes an `InvalidPhone` field error.
pub fn validate_phone(value: &Value) -> Result<Value, RuleError> {
    let text = value_text(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidPhone))?;
    format_uk_phone(&text)
        .map(Value::String)
        .ok_or_else(|| RuleError::new(ErrorKind::InvalidPhone))
}

fn parse_national_number(raw: &str) -> Result<String, PhoneParseError> {
    let trimmed = raw.trim();
    let mut digits = String::with_capacity(trimmed.len());
    for (index, c) in trimmed.chars().enumerate() {
        match c {
            '0'..='9' => digits.push(c),
            '+' if index == 0 => digits.push('+'),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return Err(PhoneParseError::InvalidCharacters),
        }
    }

    let national = if let Some(rest) = digits.strip_prefix("+44") {
        rest.strip_prefix('0').unwrap_or(rest).to_string()
    } else if let Some(rest) = digits.strip_prefix("0044") {
        rest.strip_prefix('0').unwrap_or(rest).to_string()
    } else if digits.starts_with('+') || digits.starts_with("00") {
        return Err(PhoneParseError::ForeignNumber);
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest.to_string()
    } else {
        digits
    };

    if national.len() != 10 {
        return Err(PhoneParseError::WrongLength(national.len()));
    }

    match national.chars().next() {
        Some(lead @ ('1' | '2' | '3' | '5' | '7' | '8' | '9')) => {
            if lead == '7' && national.starts_with("76") && !national.starts_with("7624") {
                return Err(PhoneParseError::UnallocatedRange(lead));
            }
            Ok(national)
        }
        Some(lead) => Err(PhoneParseError::UnallocatedRange(lead)),
        None => Err(PhoneParseError::WrongLength(0)),
    }
}

fn format_national(national: &str) -> String {
    let number = format!("0{national}");
    let group = |ranges: &[(usize, usize)]| -> String {
        ranges
            .iter()
            .map(|(start, end)| &number[*start..*end])
            .collect::<Vec<_>>()
            .join(" ")
    };

    let bytes = national.as_bytes();
    match bytes[0] {
        b'7' => group(&[(0, 5), (5, 11)]),
        b'2' => group(&[(0, 3), (3, 7), (7, 11)]),
        b'1' if bytes[1] == b'1' || bytes[2] == b'1' => group(&[(0, 4), (4, 7), (7, 11)]),
        b'1' => group(&[(0, 5), (5, 11)]),
        _ => group(&[(0, 4), (4, 7), (7, 11)]),
    }
}
