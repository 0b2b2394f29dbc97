use insights_core::{
    ConfigError, CoreError, ErrorExt, ErrorReporter, Failure, InsightsApiError,
};

#[test]
fn test_error_codes() {
    let api_error = CoreError::Api(InsightsApiError::Unauthorized { message: None });
    assert_eq!(api_error.error_code(), "API_UNAUTHORIZED");

    let rejected = CoreError::Api(InsightsApiError::Rejected {
        message: "rate limited".to_string(),
    });
    assert_eq!(rejected.error_code(), "API_REJECTED");

    let config_error = CoreError::Config(ConfigError::InvalidValue {
        field: "api_base_url".to_string(),
        value: "nope".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let internal = CoreError::Internal {
        message: "boom".to_string(),
    };
    assert_eq!(internal.error_code(), "INTERNAL");
}

#[test]
fn test_user_friendly_messages() {
    let session_error = CoreError::Api(InsightsApiError::Unauthorized { message: None });
    let message = session_error.user_friendly_message();
    assert!(message.contains("session has expired"));

    let config_error = CoreError::Config(ConfigError::InvalidValue {
        field: "default_period_days".to_string(),
        value: "9".to_string(),
    });
    assert!(config_error
        .user_friendly_message()
        .contains("default_period_days"));

    let server_error = CoreError::Api(InsightsApiError::ServerError {
        status_code: 502,
        message: None,
    });
    assert!(server_error.user_friendly_message().contains("502"));
}

#[test]
fn test_server_supplied_messages_pass_through() {
    let rejected = CoreError::Api(InsightsApiError::Rejected {
        message: "rate limited".to_string(),
    });
    assert_eq!(rejected.user_friendly_message(), "rate limited");

    let failed = CoreError::Api(InsightsApiError::RequestFailed {
        status_code: 400,
        message: Some("periodDays must be 7, 14 or 30".to_string()),
    });
    assert_eq!(
        failed.user_friendly_message(),
        "periodDays must be 7, 14 or 30"
    );
}

#[test]
fn test_failure_from_core_error() {
    let error = CoreError::Api(InsightsApiError::Rejected {
        message: "rate limited".to_string(),
    });
    let failure = Failure::from(&error);
    assert_eq!(failure.code, "API_REJECTED");
    assert_eq!(failure.message, "rate limited");
    assert_eq!(failure.to_string(), "rate limited (API_REJECTED)");
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(false);
    let error = CoreError::Api(InsightsApiError::RequestTimeout);

    // Only checks that reporting never panics.
    reporter.report_error(&error);
    reporter.report_warning(&error);
}

#[test]
fn test_status_errors_prefer_server_message() {
    let rate_limited = CoreError::Api(InsightsApiError::RateLimitExceeded {
        retry_after: Some(10),
        message: Some("rate limited".to_string()),
    });
    assert_eq!(rate_limited.user_friendly_message(), "rate limited");
    assert_eq!(rate_limited.error_code(), "API_RATE_LIMIT");

    let bare = CoreError::Api(InsightsApiError::RateLimitExceeded {
        retry_after: Some(10),
        message: None,
    });
    assert!(bare.user_friendly_message().contains("10 seconds"));

    let not_found = CoreError::Api(InsightsApiError::NotFound {
        resource: "GET /api/insights/history".to_string(),
        message: Some("Generation not found".to_string()),
    });
    assert_eq!(not_found.user_friendly_message(), "Generation not found");
}
