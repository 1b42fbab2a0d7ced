use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Languages every form string is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Cy,
}

impl Locale {
    pub fn from_code(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "cy" | "cy-gb" | "welsh" => Self::Cy,
            _ => Self::En,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Cy => "cy",
        }
    }
}

/// A dictionary holding one string per locale. Welsh falls back to English when missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cy: Option<String>,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            cy: None,
        }
    }

    pub fn bilingual(en: impl Into<String>, cy: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            cy: Some(cy.into()),
        }
    }

    pub fn localize(&self, locale: Locale) -> String {
        match (locale, &self.cy) {
            (Locale::Cy, Some(cy)) if !cy.is_empty() => cy.clone(),
            _ => self.en.clone(),
        }
    }
}

impl From<&str> for LocalizedText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Resolve a dictionary for the requested locale.
pub fn localize(locale: Locale, text: &LocalizedText) -> String {
    text.localize(locale)
}

/// Replace `{name}` placeholders with the supplied arguments; unknown placeholders are kept.
pub fn interpolate(template: &str, args: &BTreeMap<String, String>) -> String {
    let mut output = template.to_string();
    for (name, value) in args {
        let token = format!("{{{}}}", name);
        output = output.replace(&token, value);
    }
    output
}

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS_CY: [&str; 12] = [
    "Ionawr",
    "Chwefror",
    "Mawrth",
    "Ebrill",
    "Mai",
    "Mehefin",
    "Gorffennaf",
    "Awst",
    "Medi",
    "Hydref",
    "Tachwedd",
    "Rhagfyr",
];

pub(crate) fn month_name(locale: Locale, month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    match locale {
        Locale::En => MONTHS_EN.get(index).copied(),
        Locale::Cy => MONTHS_CY.get(index).copied(),
    }
}

pub(crate) fn total_label(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Total",
        Locale::Cy => "Cyfanswm",
    }
}
