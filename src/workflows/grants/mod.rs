//! Grant application forms: typed fields, reusable validation rules, conditional steps,
//! navigation between steps, and persistence of in-progress and submitted applications.

pub mod applications;
pub mod catalogue;
pub mod condition;
pub mod fields;
pub mod form;
pub mod locale;
pub mod navigation;
pub mod rules;
pub mod steps;

pub use condition::{Condition, FormData};
pub use fields::{FieldBuilder, FieldDefinition, FieldKind, FieldOption, FieldValidation};
pub use form::{
    ApplicationOverview, CrossFieldRule, EnhancedForm, FormBuilder, FormDefinitionError,
    FormModel, OverviewRow, OverviewSpec, ProgressStatus, SectionProgress, StepSummary,
};
pub use catalogue::community_grant_form;
pub use locale::{Locale, LocalizedText};
pub use navigation::{Destination, NavigationError, NavigationResolver, StepOutcome};
pub use rules::{ErrorCategory, ErrorKind, RuleError, ValidationContext};
pub use steps::{Fieldset, SectionDefinition, StepDefinition, ValidationReport};
