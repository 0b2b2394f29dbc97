use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Insights API error: {0}")]
    Api(#[from] InsightsApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum InsightsApiError {
    #[error("Session is not authenticated")]
    Unauthorized { message: Option<String> },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden {
        resource: String,
        message: Option<String>,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        message: Option<String>,
    },

    #[error("Rate limit exceeded")]
    RateLimitExceeded {
        retry_after: Option<u64>,
        message: Option<String>,
    },

    #[error("Server error: {status_code}")]
    ServerError {
        status_code: u16,
        message: Option<String>,
    },

    #[error("Request failed with status {status_code}")]
    RequestFailed {
        status_code: u16,
        message: Option<String>,
    },

    /// The backend answered 200 but flagged the operation as failed.
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Request timeout")]
    RequestTimeout,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Permission denied accessing config: {path}")]
    PermissionDenied { path: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
