use crate::error::*;
use std::fmt;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Api(e) => {
                error!("Insights API error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Api(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(e) if e.is_timeout() => {
                "The request took too long to complete. Please try again.".to_string()
            }
            CoreError::Network(_) => {
                "Network connection error. Please check your connection to the dashboard server."
                    .to_string()
            }
            CoreError::Serialization(_) => {
                "The server sent a response that could not be read.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Api(e) => e.error_code(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for InsightsApiError {
    fn log_error(&self) -> &Self {
        error!("InsightsApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("InsightsApiError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            // Server-supplied text is shown as-is when present.
            InsightsApiError::Unauthorized {
                message: Some(message),
            }
            | InsightsApiError::Forbidden {
                message: Some(message),
                ..
            }
            | InsightsApiError::NotFound {
                message: Some(message),
                ..
            }
            | InsightsApiError::RateLimitExceeded {
                message: Some(message),
                ..
            }
            | InsightsApiError::ServerError {
                message: Some(message),
                ..
            }
            | InsightsApiError::RequestFailed {
                message: Some(message),
                ..
            }
            | InsightsApiError::Rejected { message } => message.clone(),
            InsightsApiError::Unauthorized { .. } => {
                "Your session has expired. Please sign in again.".to_string()
            }
            InsightsApiError::Forbidden { .. } => {
                "You do not have permission to do that.".to_string()
            }
            InsightsApiError::NotFound { resource, .. } => format!("Could not find: {}", resource),
            InsightsApiError::RateLimitExceeded {
                retry_after: Some(seconds),
                ..
            } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                seconds
            ),
            InsightsApiError::RateLimitExceeded { .. } => {
                "Too many requests. Please wait before trying again.".to_string()
            }
            InsightsApiError::ServerError { status_code, .. } => format!(
                "The server failed to handle the request ({}). Please try again later.",
                status_code
            ),
            InsightsApiError::RequestFailed { status_code, .. } => {
                format!("Request failed with status {}.", status_code)
            }
            InsightsApiError::InvalidResponse { .. } => {
                "The server sent a response that could not be read.".to_string()
            }
            InsightsApiError::RequestTimeout => {
                "The request timed out. Please try again.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            InsightsApiError::Unauthorized { .. } => "API_UNAUTHORIZED".to_string(),
            InsightsApiError::Forbidden { .. } => "API_FORBIDDEN".to_string(),
            InsightsApiError::NotFound { .. } => "API_NOT_FOUND".to_string(),
            InsightsApiError::RateLimitExceeded { .. } => "API_RATE_LIMIT".to_string(),
            InsightsApiError::ServerError { .. } => "API_SERVER_ERROR".to_string(),
            InsightsApiError::RequestFailed { .. } => "API_REQUEST_FAILED".to_string(),
            InsightsApiError::Rejected { .. } => "API_REJECTED".to_string(),
            InsightsApiError::InvalidResponse { .. } => "API_INVALID_RESPONSE".to_string(),
            InsightsApiError::RequestTimeout => "API_TIMEOUT".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::PermissionDenied { .. } => {
                "Permission denied accessing configuration. Please check file permissions."
                    .to_string()
            }
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::PermissionDenied { .. } => "CONFIG_PERMISSION_DENIED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

/// Cloneable failure summary handed to the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: String,
    pub message: String,
}

impl Failure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&CoreError> for Failure {
    fn from(error: &CoreError) -> Self {
        Self {
            code: error.error_code(),
            message: error.user_friendly_message(),
        }
    }
}

impl From<CoreError> for Failure {
    fn from(error: CoreError) -> Self {
        Self::from(&error)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
