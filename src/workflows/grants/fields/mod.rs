//! Typed questions: each [`FieldKind`] supplies a default schema, default error messages,
//! and a display format for bound values.

mod display;
mod messages;

use serde::Serialize;
use serde_json::Value;

use super::condition::{Condition, FormData};
use super::locale::{interpolate, Locale, LocalizedText};
use super::rules::{
    is_empty_value, word_count, DateConstraints, ErrorKind, MonthYearConstraints, Rule,
    RuleError, Schema, ValidationContext,
};

pub use display::format_number;
pub use messages::ErrorMessage;

/// The closed set of question types.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text { max_length: Option<usize> },
    Name,
    Email,
    Phone,
    Url,
    Currency { min: Option<u64>, max: Option<u64> },
    Percentage,
    Textarea {
        min_words: Option<usize>,
        max_words: usize,
    },
    Budget {
        min: Option<u64>,
        max: Option<u64>,
        max_items: usize,
    },
    Date(DateConstraints),
    DayMonth,
    MonthYear(MonthYearConstraints),
    Radio,
    Checkbox,
    Address,
}

impl FieldKind {
    pub const fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Name => "full-name",
            FieldKind::Email => "email",
            FieldKind::Phone => "tel",
            FieldKind::Url => "url",
            FieldKind::Currency { .. } => "currency",
            FieldKind::Percentage => "percentage",
            FieldKind::Textarea { .. } => "textarea",
            FieldKind::Budget { .. } => "budget",
            FieldKind::Date(_) => "date",
            FieldKind::DayMonth => "day-month",
            FieldKind::MonthYear(_) => "month-year",
            FieldKind::Radio => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Address => "address",
        }
    }

    pub const fn is_choice(&self) -> bool {
        matches!(self, FieldKind::Radio | FieldKind::Checkbox)
    }

    /// Rule tree used when the field does not supply its own.
    pub fn default_schema(&self, options: &[FieldOption]) -> Schema {
        let rule = match self {
            FieldKind::Text { max_length } => Rule::Text {
                max_length: *max_length,
            },
            FieldKind::Name => Rule::Name,
            FieldKind::Email => Rule::Email,
            FieldKind::Phone => Rule::Phone,
            FieldKind::Url => Rule::Url,
            FieldKind::Currency { min, max } => Rule::Number {
                min: min.map(|value| value as f64),
                max: max.map(|value| value as f64),
                integer: true,
            },
            FieldKind::Percentage => Rule::Number {
                min: Some(0.0),
                max: Some(100.0),
                integer: false,
            },
            FieldKind::Textarea {
                min_words,
                max_words,
            } => Rule::WordCount {
                min: *min_words,
                max: Some(*max_words),
            },
            FieldKind::Budget { min, max, max_items } => {
                return Schema::new()
                    .rule(Rule::BudgetItems {
                        max_items: Some(*max_items),
                    })
                    .rule(Rule::BudgetRange {
                        min: *min,
                        max: *max,
                    });
            }
            FieldKind::Date(constraints) => Rule::DateParts(*constraints),
            FieldKind::DayMonth => Rule::DayMonth,
            FieldKind::MonthYear(constraints) => Rule::MonthYear(*constraints),
            FieldKind::Radio | FieldKind::Checkbox => Rule::Choice {
                values: options
                    .iter()
                    .map(|option| option.value.clone())
                    .collect(),
                multiple: matches!(self, FieldKind::Checkbox),
            },
            FieldKind::Address => Rule::Address,
        };
        Schema::new().rule(rule)
    }
}

/// One selectable answer of a radio or checkbox field.
#[derive(Debug, Clone)]
pub struct FieldOption {
    pub value: String,
    pub label: LocalizedText,
    pub explanation: Option<LocalizedText>,
    pub show_when: Option<Condition>,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<LocalizedText>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            explanation: None,
            show_when: None,
        }
    }

    pub fn explanation(mut self, explanation: impl Into<LocalizedText>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn show_when(mut self, condition: Condition) -> Self {
        self.show_when = Some(condition);
        self
    }

    pub fn is_visible(&self, data: &FormData) -> bool {
        self.show_when
            .as_ref()
            .map(|condition| condition.evaluate(data))
            .unwrap_or(true)
    }
}

/// Outcome of running a field's schema: the (possibly coerced) value plus the first error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValidation {
    pub value: Option<Value>,
    pub error: Option<RuleError>,
}

impl FieldValidation {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// One question. Built once through [`FieldBuilder`]; binding a value produces a new instance.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    name: String,
    kind: FieldKind,
    label: LocalizedText,
    explanation: Option<LocalizedText>,
    is_required: bool,
    schema: Schema,
    options: Vec<FieldOption>,
    messages: Vec<ErrorMessage>,
    value: Option<Value>,
}

impl FieldDefinition {
    pub fn builder(name: impl Into<String>, kind: FieldKind) -> FieldBuilder {
        FieldBuilder {
            name: name.into(),
            kind,
            label: LocalizedText::default(),
            explanation: None,
            is_required: true,
            options: Vec::new(),
            messages: Vec::new(),
            schema: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn label(&self) -> &LocalizedText {
        &self.label
    }

    pub fn explanation(&self) -> Option<&LocalizedText> {
        self.explanation.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &[FieldOption] {
        &self.options
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn with_value(mut self, value: impl Into<Option<Value>>) -> Self {
        self.value = value.into();
        self
    }

    pub fn visible_options(&self, data: &FormData) -> Vec<&FieldOption> {
        self.options
            .iter()
            .filter(|option| option.is_visible(data))
            .collect()
    }

    pub fn validate(&self) -> FieldValidation {
        self.validate_with(&ValidationContext::today())
    }

    pub fn validate_with(&self, ctx: &ValidationContext<'_>) -> FieldValidation {
        let raw = match &self.value {
            Some(value) if !is_empty_value(value) => value,
            _ => {
                let error = self
                    .is_required
                    .then(|| RuleError::new(ErrorKind::Required));
                return FieldValidation { value: None, error };
            }
        };

        match self.schema.apply(raw, ctx) {
            Ok(value) => FieldValidation {
                value: Some(value),
                error: None,
            },
            Err(error) => FieldValidation {
                value: Some(raw.clone()),
                error: Some(error),
            },
        }
    }

    pub fn display_value(&self, locale: Locale) -> String {
        match &self.value {
            Some(value) => display::display_value(self, value, locale),
            None => String::new(),
        }
    }

    /// Live counter for textareas, using the same tokenizer as the word limit.
    pub fn word_count(&self) -> Option<usize> {
        match (&self.kind, &self.value) {
            (FieldKind::Textarea { .. }, Some(Value::String(text))) => Some(word_count(text)),
            (FieldKind::Textarea { .. }, _) => Some(0),
            _ => None,
        }
    }

    /// Resolve the text for `error`: this field's message for the kind, then the default
    /// for the kind, then this field's generic fallback.
    pub fn error_message(&self, error: &RuleError, locale: Locale) -> String {
        let template = self
            .messages
            .iter()
            .find(|message| message.kind == Some(error.kind))
            .map(|message| message.text.clone())
            .or_else(|| messages::default_message(&self.kind, error.kind))
            .unwrap_or_else(|| self.fallback_message());

        let mut args = error.params.clone();
        args.insert("label".to_string(), self.label.localize(locale));
        interpolate(&template.localize(locale), &args)
    }

    fn fallback_message(&self) -> LocalizedText {
        self.messages
            .iter()
            .find(|message| message.kind.is_none())
            .map(|message| message.text.clone())
            .unwrap_or_else(messages::generic_fallback)
    }
}

/// Collects a field's properties; [`FieldBuilder::build`] derives the schema exactly once.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name: String,
    kind: FieldKind,
    label: LocalizedText,
    explanation: Option<LocalizedText>,
    is_required: bool,
    options: Vec<FieldOption>,
    messages: Vec<ErrorMessage>,
    schema: Option<Schema>,
}

impl FieldBuilder {
    pub fn label(mut self, label: impl Into<LocalizedText>) -> Self {
        self.label = label.into();
        self
    }

    pub fn explanation(mut self, explanation: impl Into<LocalizedText>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    pub fn option(mut self, option: FieldOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = FieldOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn message(mut self, kind: ErrorKind, text: impl Into<LocalizedText>) -> Self {
        self.messages.push(ErrorMessage {
            kind: Some(kind),
            text: text.into(),
        });
        self
    }

    pub fn fallback_message(mut self, text: impl Into<LocalizedText>) -> Self {
        self.messages.push(ErrorMessage {
            kind: None,
            text: text.into(),
        });
        self
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn build(self) -> FieldDefinition {
        let schema = match self.schema {
            Some(schema) => schema,
            None => self.kind.default_schema(&self.options),
        };

        FieldDefinition {
            name: self.name,
            kind: self.kind,
            label: self.label,
            explanation: self.explanation,
            is_required: self.is_required,
            schema,
            options: self.options,
            messages: self.messages,
            value: None,
        }
    }
}
