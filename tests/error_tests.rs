//! Tests for the error system.

use agentrun::client::http::status_to_error;
use agentrun::error::*;
use agentrun::types::RunStatus;

#[test]
fn error_api_creation() {
    let err = AgentRunError::api(404, "Not found");
    assert!(matches!(&err, AgentRunError::Api { status: 404, code: None, .. }));
    assert_eq!(err.to_string(), "API error (status 404): Not found");
}

#[test]
fn run_failure_message_names_status_and_reason() {
    let err = AgentRunError::RunFailed {
        status: RunStatus::Failed,
        message: Some("quota exceeded".to_string()),
    };
    assert_eq!(err.to_string(), "Run failed: quota exceeded");

    let err = AgentRunError::RunFailed {
        status: RunStatus::Expired,
        message: None,
    };
    assert_eq!(err.to_string(), "Run expired: no error details reported");
}

#[test]
fn error_helper_mappings_are_stable_for_major_variants() {
    struct Case {
        error: AgentRunError,
        expected_category: ErrorCategory,
        expected_retryable: bool,
        expected_recovery: RecoverySuggestion,
    }

    let network_error = reqwest::Client::new()
        .get("http://[::1")
        .build()
        .unwrap_err();
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "disk");
    let serde_error = serde_json::from_str::<serde_json::Value>("{not-json}").unwrap_err();

    let cases = vec![
        Case {
            error: AgentRunError::Authentication("bad-token".to_string()),
            expected_category: ErrorCategory::Authentication,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckCredentials,
        },
        Case {
            error: AgentRunError::RateLimited {
                retry_after_ms: Some(1000),
            },
            expected_category: ErrorCategory::RateLimit,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: AgentRunError::Timeout(5000),
            expected_category: ErrorCategory::Timeout,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::IncreaseTimeout,
        },
        Case {
            error: AgentRunError::PollLimitExceeded(20),
            expected_category: ErrorCategory::Timeout,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::IncreaseTimeout,
        },
        Case {
            error: AgentRunError::Configuration("bad-config".to_string()),
            expected_category: ErrorCategory::Configuration,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckConfiguration,
        },
        Case {
            error: AgentRunError::AgentNotFound("asst_missing".to_string()),
            expected_category: ErrorCategory::NotFound,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckConfiguration,
        },
        Case {
            error: AgentRunError::Network(network_error),
            expected_category: ErrorCategory::Network,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: AgentRunError::Serialization(serde_error),
            expected_category: ErrorCategory::Serialization,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: AgentRunError::RunFailed {
                status: RunStatus::Failed,
                message: None,
            },
            expected_category: ErrorCategory::RunFailure,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::InspectRun,
        },
        Case {
            error: AgentRunError::Cancelled,
            expected_category: ErrorCategory::Cancellation,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::None,
        },
        Case {
            error: AgentRunError::api(401, "Unauthorized"),
            expected_category: ErrorCategory::Authentication,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckCredentials,
        },
        Case {
            error: AgentRunError::api(429, "Rate limited"),
            expected_category: ErrorCategory::RateLimit,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: AgentRunError::api(503, "Server unavailable"),
            expected_category: ErrorCategory::Server,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: AgentRunError::api(418, "Teapot"),
            expected_category: ErrorCategory::Api,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: AgentRunError::Io(io_error),
            expected_category: ErrorCategory::Unknown,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: AgentRunError::InvalidState("undecided".to_string()),
            expected_category: ErrorCategory::Unknown,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
    ];

    for case in cases {
        assert_eq!(case.error.category(), case.expected_category);
        assert_eq!(case.error.is_retryable(), case.expected_retryable);
        assert_eq!(case.error.recovery_suggestion(), case.expected_recovery);
    }
}

#[test]
fn only_configuration_and_missing_agent_exit_cleanly() {
    assert!(AgentRunError::Configuration("x".into()).is_clean_exit());
    assert!(AgentRunError::AgentNotFound("x".into()).is_clean_exit());
    assert!(!AgentRunError::NotFound("x".into()).is_clean_exit());
    assert!(!AgentRunError::Cancelled.is_clean_exit());
}

#[test]
fn service_error_body_details_are_extracted() {
    let body = r#"{"error":{"code":"invalid_request","message":"thread_id is malformed"}}"#;
    match status_to_error(400, body, None) {
        AgentRunError::Api {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 400);
            assert_eq!(code.as_deref(), Some("invalid_request"));
            assert_eq!(message, "thread_id is malformed");
        }
        other => panic!("expected api error, got {other:?}"),
    }

    match status_to_error(502, "  bad gateway \n", None) {
        AgentRunError::Api { code, message, .. } => {
            assert_eq!(code, None);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}
