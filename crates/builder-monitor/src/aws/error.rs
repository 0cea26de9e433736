//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_appstream::error::ProvideErrorMetadata;
use thiserror::Error;

/// AWS error categories used when reporting per-builder failures
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (builder deleted between listing and acting)
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Rate limit exceeded (the next invocation retries naturally)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Builder is mid-transition (retryable)
    #[error("Concurrent modification in progress")]
    ConcurrentModification,

    /// Builder state does not allow the operation
    #[error("Operation not permitted: {message}")]
    NotPermitted { message: String },

    /// Credentials lack the required permission
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this error is expected to clear up on its own
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled | AwsError::ConcurrentModification)
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            AwsError::Throttled => Some("AWS API rate limit hit. The next invocation will retry."),
            AwsError::ConcurrentModification => {
                Some("The builder is changing state. The next invocation will retry.")
            }
            AwsError::AccessDenied { .. } => Some(
                "Check that the monitor's role allows appstream:Describe*, \
                 appstream:ListTagsForResource, appstream:Stop*, dynamodb item access \
                 and sns:Publish.",
            ),
            _ => None,
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException", "NotFound", "NotFoundException"];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestLimitExceeded",
    "ProvisionedThroughputExceededException",
    "TooManyRequestsException",
];

/// Known AWS error codes for state transitions in progress
const CONCURRENT_CODES: &[&str] = &["ConcurrentModificationException"];

/// Known AWS error codes for operations refused in the current state
const NOT_PERMITTED_CODES: &[&str] = &["OperationNotPermittedException", "InvalidAccountStatusException"];

/// Known AWS error codes for permission problems
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "AuthorizationError",
    "UnrecognizedClientException",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if CONCURRENT_CODES.contains(&c) => AwsError::ConcurrentModification,
        Some(c) if NOT_PERMITTED_CODES.contains(&c) => AwsError::NotPermitted { message },
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Return the metadata of the first cause that is one of the given SDK error types.
macro_rules! classify_sdk_cause {
    ($cause:expr, $( $sdk:ident :: $op:ident :: $err:ident ),+ $(,)?) => {
        $(
            if let Some(e) =
                $cause.downcast_ref::<$sdk::error::SdkError<$sdk::operation::$op::$err>>()
            {
                return classify_aws_error(e.code(), e.message());
            }
        )+
    };
}

/// Classify an error from an anyhow::Error by extracting the AWS error code.
///
/// Walks the error chain looking for the SDK operation errors the monitor can
/// produce. Falls back to string matching on the Debug representation if no
/// typed error is found.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    for cause in error.chain() {
        classify_sdk_cause!(
            cause,
            aws_sdk_appstream::describe_app_block_builders::DescribeAppBlockBuildersError,
            aws_sdk_appstream::describe_image_builders::DescribeImageBuildersError,
            aws_sdk_appstream::list_tags_for_resource::ListTagsForResourceError,
            aws_sdk_appstream::stop_app_block_builder::StopAppBlockBuilderError,
            aws_sdk_appstream::stop_image_builder::StopImageBuilderError,
            aws_sdk_dynamodb::get_item::GetItemError,
            aws_sdk_dynamodb::put_item::PutItemError,
            aws_sdk_dynamodb::update_item::UpdateItemError,
            aws_sdk_dynamodb::delete_item::DeleteItemError,
            aws_sdk_sns::publish::PublishError,
        );
    }

    // Fallback: extract error code from debug string representation
    let debug_str = format!("{:?}", error);
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&error.to_string()));
    }

    AwsError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

/// Treat a "not found" failure as success.
///
/// Used where the desired end state is "gone" or "stopped" and a builder
/// that no longer exists already satisfies it.
pub fn ignore_not_found(result: anyhow::Result<()>) -> anyhow::Result<()> {
    match result {
        Err(e) if classify_anyhow_error(&e).is_not_found() => Ok(()),
        other => other,
    }
}

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    let known = NOT_FOUND_CODES
        .iter()
        .chain(THROTTLING_CODES)
        .chain(CONCURRENT_CODES)
        .chain(NOT_PERMITTED_CODES)
        .chain(ACCESS_DENIED_CODES);
    // Longest first so "ThrottlingException" wins over "Throttling"
    let mut known: Vec<&str> = known.copied().collect();
    known.sort_by_key(|c| std::cmp::Reverse(c.len()));
    if let Some(code) = known.into_iter().find(|c| debug_str.contains(c)) {
        return Some(code.to_string());
    }

    // Try to extract any code from `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}
