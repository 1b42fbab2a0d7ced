use super::FieldKind;
use crate::workflows::grants::locale::LocalizedText;
use crate::workflows::grants::rules::ErrorKind;

/// Per-field message override. `kind: None` is the field's generic fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMessage {
    pub kind: Option<ErrorKind>,
    pub text: LocalizedText,
}

pub(super) fn generic_fallback() -> LocalizedText {
    LocalizedText::bilingual(
        "Check your answer to {label}",
        "Gwiriwch eich ateb i {label}",
    )
}

pub(super) fn default_message(field: &FieldKind, kind: ErrorKind) -> Option<LocalizedText> {
    variant_message(field, kind).or_else(|| library_message(kind))
}

fn variant_message(field: &FieldKind, kind: ErrorKind) -> Option<LocalizedText> {
    let text = match (field, kind) {
        (FieldKind::Radio | FieldKind::Checkbox, ErrorKind::Required) => {
            LocalizedText::bilingual("Select an option", "Dewiswch opsiwn")
        }
        (
            FieldKind::Date(_) | FieldKind::DayMonth | FieldKind::MonthYear(_),
            ErrorKind::Required,
        ) => LocalizedText::bilingual("Enter a date", "Rhowch ddyddiad"),
        (FieldKind::Name, ErrorKind::ObjectsMustNotMatch) => {
            LocalizedText::new("This contact must be a different person from the other contact")
        }
        (FieldKind::Address, ErrorKind::ObjectsMustNotMatch) => {
            LocalizedText::new("This address must be different from the other contact's address")
        }
        (FieldKind::Address, ErrorKind::InvalidPostcode) => {
            LocalizedText::bilingual("Enter a real postcode", "Rhowch god post go iawn")
        }
        (FieldKind::Budget { .. }, ErrorKind::Required) => {
            LocalizedText::new("Enter a project budget")
        }
        (FieldKind::Budget { .. }, ErrorKind::InvalidNumber) => {
            LocalizedText::new("Enter a whole number of pounds for each cost")
        }
        (FieldKind::Currency { .. }, ErrorKind::InvalidNumber) => {
            LocalizedText::new("Enter a whole number of pounds, like 1500")
        }
        (FieldKind::Currency { .. }, ErrorKind::NumberBelowMinimum) => {
            LocalizedText::new("Amount must be at least £{min}")
        }
        (FieldKind::Currency { .. }, ErrorKind::NumberAboveMaximum) => {
            LocalizedText::new("Amount must be no more than £{max}")
        }
        (FieldKind::Percentage, ErrorKind::NumberBelowMinimum | ErrorKind::NumberAboveMaximum) => {
            LocalizedText::new("Enter a percentage between 0 and 100")
        }
        (FieldKind::Textarea { .. }, ErrorKind::Required) => {
            LocalizedText::bilingual("Tell us about {label}", "Dywedwch wrthym am {label}")
        }
        _ => return None,
    };
    Some(text)
}

fn library_message(kind: ErrorKind) -> Option<LocalizedText> {
    let text = match kind {
        ErrorKind::Required => LocalizedText::bilingual("Enter {label}", "Rhowch {label}"),
        ErrorKind::TooLong => LocalizedText::new("Answer must be {max} characters or fewer"),
        ErrorKind::InvalidEmail => LocalizedText::bilingual(
            "Enter an email address in the correct format, like name@example.com",
            "Rhowch gyfeiriad e-bost yn y fformat cywir, fel enw@enghraifft.com",
        ),
        ErrorKind::InvalidPhone => LocalizedText::bilingual(
            "Enter a UK telephone number, like 01632 960 001 or 07700 900 982",
            "Rhowch rif ffôn yn y DU, fel 01632 960 001 neu 07700 900 982",
        ),
        ErrorKind::InvalidUrl => LocalizedText::new("Enter a real website address"),
        ErrorKind::InvalidPostcode => {
            LocalizedText::bilingual("Enter a real postcode", "Rhowch god post go iawn")
        }
        ErrorKind::InvalidNumber => LocalizedText::new("Enter a number"),
        ErrorKind::NumberBelowMinimum => LocalizedText::new("Must be at least {min}"),
        ErrorKind::NumberAboveMaximum => LocalizedText::new("Must be no more than {max}"),
        ErrorKind::InvalidOption => {
            LocalizedText::bilingual("Select a valid option", "Dewiswch opsiwn dilys")
        }
        ErrorKind::IncompleteName => LocalizedText::new("Enter a first name and last name"),
        ErrorKind::IncompleteAddress => LocalizedText::new("Enter a full UK address"),
        ErrorKind::InvalidDate => {
            LocalizedText::bilingual("Enter a real date", "Rhowch ddyddiad go iawn")
        }
        ErrorKind::DateBeforeMinimum => LocalizedText::new("Date must be on or after {min}"),
        ErrorKind::DateAfterMaximum => LocalizedText::new("Date must be on or before {max}"),
        ErrorKind::DateNotInPast => LocalizedText::new("Date must be in the past"),
        ErrorKind::DateTooRecent => LocalizedText::new("Date must be at least {amount} ago"),
        ErrorKind::DateBeforeReference => {
            LocalizedText::new("Date must be the same as or after {reference}")
        }
        ErrorKind::DateOutsideRange => LocalizedText::new("Date must be within {limit}"),
        ErrorKind::TooFewWords => LocalizedText::new("Answer must be at least {min} words"),
        ErrorKind::TooManyWords => LocalizedText::new("Answer must be no more than {max} words"),
        ErrorKind::BudgetItemMissing => {
            LocalizedText::new("Enter a description for each item in the budget")
        }
        ErrorKind::BudgetCostMissing => LocalizedText::new("Enter a cost for each item"),
        ErrorKind::TooManyBudgetItems => {
            LocalizedText::new("You can only add up to {max} budget items")
        }
        ErrorKind::UnderBudget => {
            LocalizedText::new("Costs you would like us to fund must be greater than £{min}")
        }
        ErrorKind::OverBudget => {
            LocalizedText::new("Costs you would like us to fund must be less than £{max}")
        }
        ErrorKind::UnderProjectBudgetTotal => LocalizedText::new(
            "Total cost must be the same as or higher than the amount you’re asking us to fund (£{budget})",
        ),
        ErrorKind::ObjectsMustNotMatch => {
            LocalizedText::new("This answer must be different from the related answer")
        }
        ErrorKind::InvalidType => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::grants::locale::Locale;

    #[test]
    fn variant_defaults_win_over_library_defaults() {
        let text = default_message(&FieldKind::Radio, ErrorKind::Required).expect("message");
        assert_eq!(text.localize(Locale::En), "Select an option");

        let text = default_message(&FieldKind::Email, ErrorKind::Required).expect("message");
        assert_eq!(text.localize(Locale::En), "Enter {label}");
    }

    #[test]
    fn both_budget_shortfalls_have_distinct_messages() {
        let under = library_message(ErrorKind::UnderBudget).expect("message");
        let under_total = library_message(ErrorKind::UnderProjectBudgetTotal).expect("message");
        assert_ne!(under, under_total);
    }

    #[test]
    fn invalid_type_has_no_default() {
        assert!(default_message(&FieldKind::Email, ErrorKind::InvalidType).is_none());
    }
}
