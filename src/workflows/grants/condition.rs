use std::fmt;
use std::ops::Not;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Accumulated answers for one application, keyed by field name.
pub type FormData = Map<String, Value>;

/// Predicate over the whole merged form data, used by steps and options.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn(&FormData) -> bool + Send + Sync>);

impl Condition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&FormData) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Matches when `field` holds the string `expected`, or an array containing it.
    pub fn field_equals(field: impl Into<String>, expected: impl Into<String>) -> Self {
        let field = field.into();
        let expected = expected.into();
        Self::new(move |data| match data.get(&field) {
            Some(Value::String(value)) => *value == expected,
            Some(Value::Array(values)) => values
                .iter()
                .any(|value| value.as_str() == Some(expected.as_str())),
            _ => false,
        })
    }

    /// Matches when `field` holds any of `expected`.
    pub fn field_in(field: impl Into<String>, expected: &[&str]) -> Self {
        let field = field.into();
        let expected: Vec<String> = expected.iter().map(|value| value.to_string()).collect();
        Self::new(move |data| {
            data.get(&field)
                .and_then(Value::as_str)
                .map(|value| expected.iter().any(|candidate| candidate == value))
                .unwrap_or(false)
        })
    }

    pub fn evaluate(&self, data: &FormData) -> bool {
        (self.0)(data)
    }
}

impl Not for Condition {
    type Output = Self;

    fn not(self) -> Self {
        Self::new(move |data| !self.evaluate(data))
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}
