use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::{value_text, ErrorKind, RuleError, ValidationContext};

/// External address-lookup service. Implementations live outside this crate.
pub trait AddressLookup: Send + Sync {
    fn postcode_exists(&self, postcode: &str) -> Result<bool, LookupError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("address lookup timed out")]
    Timeout,
    #[error("address lookup unavailable: {0}")]
    Unavailable(String),
}

fn postcode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(GIR ?0AA|(?:[A-PR-UWYZ](?:[0-9][0-9A-HJKPSTUW]?|[A-HK-Y][0-9][0-9ABEHMNPRVWXY]?)) ?[0-9][ABD-HJLNP-UW-Z]{2})$",
        )
        .expect("postcode pattern compiles")
    })
}

/// Canonical form: uppercase, inner whitespace removed, single space before the inward code.
pub fn normalize_postcode(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if compact.len() < 5 || compact.len() > 7 || !postcode_pattern().is_match(&compact) {
        return None;
    }
    let (outward, inward) = compact.split_at(compact.len() - 3);
    Some(format!("{outward} {inward}"))
}

/// Format check, then an optional existence check through the lookup service. Lookup
/// failures are reported as an invalid postcode rather than escalated.
pub fn validate_postcode(value: &Value, ctx: &ValidationContext<'_>) -> Result<Value, RuleError> {
    let text = value_text(value).ok_or_else(|| RuleError::new(ErrorKind::InvalidPostcode))?;
    let postcode =
        normalize_postcode(&text).ok_or_else(|| RuleError::new(ErrorKind::InvalidPostcode))?;

    if let Some(lookup) = ctx.address_lookup {
        match lookup.postcode_exists(&postcode) {
            Ok(true) => {}
            Ok(false) => return Err(RuleError::new(ErrorKind::InvalidPostcode)),
            Err(err) => {
                warn!(
                    %postcode,
                    error = %err,
                    "address lookup failed; treating postcode as invalid"
                );
                return Err(RuleError::new(ErrorKind::InvalidPostcode));
            }
        }
    }

    Ok(Value::String(postcode))
}
