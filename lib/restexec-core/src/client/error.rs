use std::time::Duration;

use super::decoder::DecodeError;

/// Errors raised while configuring a [`RestClient`](super::RestClient) or building a request.
///
/// Executions never return this type; their failures are reported through
/// [`ExecutionError`] inside the response envelope.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum RestClientError {
    /// URL parsing error when constructing request URLs.
    UrlError(url::ParseError),

    /// Invalid URI given as base URL.
    InvalidUri(http::uri::InvalidUri),

    /// HTTP protocol error from the http crate.
    ///
    /// Occurs when the base URI cannot be assembled from its parts.
    HttpError(http::Error),

    /// Invalid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    ///
    /// Occurs when header values contain invalid characters.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// JSON serialization error of a request body.
    JsonValueError(serde_json::Error),

    /// Invalid base path configuration.
    #[display("Invalid base path: {error}")]
    #[from(skip)]
    InvalidBasePath {
        /// Description of why the base path is invalid.
        error: String,
    },

    /// The base URL has no host.
    #[display("Invalid base URL '{url}': missing host")]
    #[from(skip)]
    MissingHost {
        /// The rejected URL.
        url: String,
    },

    /// Data serialization failed.
    ///
    /// Occurs when request data cannot be converted to the required format.
    #[display("Serialization error: {message}")]
    #[from(skip)]
    SerializationError {
        /// Description of the serialization failure.
        message: String,
    },
}

/// Why an execution did not complete.
///
/// Every variant is captured at the boundary where it happens and stored in the
/// [`RestResponse`](super::RestResponse); none of them escapes `execute`.
#[derive(Debug, derive_more::Error, derive_more::Display)]
pub enum ExecutionError {
    /// The transport failed at the network layer (connection refused, DNS, reset...).
    #[display("{message}")]
    Transport {
        /// Description reported by the transport.
        message: String,
    },

    /// The deadline elapsed before the transport answered.
    #[display("Request timed out after {}ms", timeout.as_millis())]
    Timeout {
        /// The enforced timeout.
        timeout: Duration,
    },

    /// The caller cancelled the execution.
    #[display("Request was aborted")]
    Aborted,

    /// A pre-deserialization hook failed; the message is kept verbatim.
    #[display("{message}")]
    Hook {
        /// Message of the hook failure.
        message: String,
    },

    /// The content decoder rejected the response body.
    #[display("{_0}")]
    Decode(DecodeError),

    /// The request could not be turned into a transport request.
    #[display("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },
}

impl From<RestClientError> for ExecutionError {
    fn from(error: RestClientError) -> Self {
        Self::InvalidRequest {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RestClientError>();
        assert_sync::<RestClientError>();
        assert_send::<ExecutionError>();
        assert_sync::<ExecutionError>();
    }

    #[test]
    fn test_hook_error_message_is_verbatim() {
        let error = ExecutionError::Hook {
            message: "Thrown from pre-deserialization hook".to_string(),
        };

        insta::assert_snapshot!(error.to_string(), @"Thrown from pre-deserialization hook");
    }

    #[test]
    fn test_timeout_error_message() {
        let error = ExecutionError::Timeout {
            timeout: Duration::from_millis(200),
        };

        insta::assert_snapshot!(error.to_string(), @"Request timed out after 200ms");
    }

    #[test]
    fn test_client_error_becomes_invalid_request() {
        let error = ExecutionError::from(RestClientError::MissingHost {
            url: "file:///tmp".to_string(),
        });

        insta::assert_snapshot!(error.to_string(), @"Invalid request: Invalid base URL 'file:///tmp': missing host");
    }
}
