use std::fmt;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::grants::applications::ApplicationServiceError;
use crate::workflows::grants::form::FormDefinitionError;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Form(FormDefinitionError),
    Service(ApplicationServiceError),
    Io(std::io::Error),
    Json(serde_json::Error),
    Input(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            AppError::Form(err) => write!(f, "form definition error: {err}"),
            AppError::Service(err) => write!(f, "application error: {err}"),
            AppError::Io(err) => write!(f, "io error: {err}"),
            AppError::Json(err) => write!(f, "invalid json: {err}"),
            AppError::Input(reason) => write!(f, "invalid input: {reason}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Form(err) => Some(err),
            AppError::Service(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Input(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<FormDefinitionError> for AppError {
    fn from(value: FormDefinitionError) -> Self {
        Self::Form(value)
    }
}

impl From<ApplicationServiceError> for AppError {
    fn from(value: ApplicationServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn wraps_sources() {
        let err = AppError::from(FormDefinitionError::NoSections);
        assert_eq!(
            err.to_string(),
            "form definition error: form has no sections"
        );
        assert!(err.source().is_some());
        assert!(AppError::Input("missing".to_string()).source().is_none());
    }
}
