/*!
 * Tests for error classification and conversion
 */

use doctrans::errors::{AppError, BackendError, DictionaryError, ProviderError, TranslationError};

/// Test that provider failures map onto retry classes
#[test]
fn test_backendError_fromProviderError_shouldClassify() {
    let cases = [
        (ProviderError::ConnectionError("reset".to_string()), true),
        (ProviderError::RateLimitExceeded("slow down".to_string()), true),
        (ProviderError::RequestFailed("timeout".to_string()), true),
        (
            ProviderError::ApiError {
                status_code: 408,
                message: "request timeout".to_string(),
            },
            true,
        ),
        (
            ProviderError::ApiError {
                status_code: 500,
                message: "oops".to_string(),
            },
            true,
        ),
        (
            ProviderError::ApiError {
                status_code: 404,
                message: "no such model".to_string(),
            },
            false,
        ),
        (ProviderError::AuthenticationError("bad key".to_string()), false),
    ];

    for (error, transient) in cases {
        let description = error.to_string();
        assert_eq!(BackendError::from(error).is_transient(), transient, "{}", description);
    }
}

/// Test that unparseable responses count as malformed
#[test]
fn test_backendError_fromParseError_shouldBeMalformed() {
    let error = BackendError::from(ProviderError::ParseError("not json".to_string()));
    assert!(matches!(error, BackendError::Malformed(_)));
}

/// Test that the umbrella error keeps the source message
#[test]
fn test_appError_fromTypedErrors_shouldWrapMessages() {
    let translation = AppError::from(TranslationError::UnitFailed {
        unit_id: "p7".to_string(),
        reason: "timeout".to_string(),
    });
    let dictionary = AppError::from(DictionaryError::NoTempPath);
    let io = AppError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));

    assert!(translation.to_string().contains("p7"));
    assert!(dictionary.to_string().contains("temp dictionary"));
    assert!(matches!(io, AppError::File(_)));
}
