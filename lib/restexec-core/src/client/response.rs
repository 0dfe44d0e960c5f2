use std::borrow::Cow;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use super::error::ExecutionError;
use super::status::ResponseStatus;

/// The single result of an execution.
///
/// An execution never fails with a `Result::Err`: every outcome, including
/// network failures, timeouts, aborts and hook faults, is folded into this
/// envelope.
///
/// * [`ResponseStatus::Completed`] has no error; `data` is present iff the body was decoded.
/// * Any other status carries an [`ExecutionError`] and never carries `data`.
/// * `content` and `status_code` are present only when a response was received.
#[derive(Debug)]
pub struct RestResponse<T> {
    response_status: ResponseStatus,
    status_code: Option<StatusCode>,
    headers: HeaderMap,
    content: Option<Bytes>,
    data: Option<T>,
    error: Option<ExecutionError>,
}

impl<T> RestResponse<T> {
    pub(in crate::client) fn assemble(
        response_status: ResponseStatus,
        status_code: Option<StatusCode>,
        headers: HeaderMap,
        content: Option<Bytes>,
        data: Option<T>,
        error: Option<ExecutionError>,
    ) -> Self {
        let (data, error) = match response_status {
            ResponseStatus::Completed => (data, None),
            _ => (None, error),
        };
        let (status_code, content) = match response_status {
            ResponseStatus::TimedOut | ResponseStatus::Aborted => (None, None),
            _ => (status_code, content),
        };

        Self {
            response_status,
            status_code,
            headers,
            content,
            data,
            error,
        }
    }

    /// The client-side outcome; check it before trusting [`Self::data`].
    pub fn response_status(&self) -> ResponseStatus {
        self.response_status
    }

    /// HTTP status code, absent when no response was received.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }

    /// Response headers, empty when no response was received.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes, absent when no response was received.
    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    /// Raw body as text, lossily decoded.
    pub fn content_text(&self) -> Option<Cow<'_, str>> {
        self.content
            .as_ref()
            .map(|content| String::from_utf8_lossy(content))
    }

    /// The `Content-Type` of the response, if present and well formed.
    pub fn content_type(&self) -> Option<mime::Mime> {
        use headers::HeaderMapExt;

        self.headers
            .typed_get::<headers::ContentType>()
            .map(mime::Mime::from)
    }

    /// The decoded payload, present only for a completed, decoded response.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Consumes the envelope and returns the decoded payload.
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// The fault of a non-completed execution.
    pub fn error(&self) -> Option<&ExecutionError> {
        self.error.as_ref()
    }

    /// The human-readable error message, absent for completed responses.
    ///
    /// A hook failure keeps the hook message verbatim.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// `true` when the execution completed with a 2xx status code.
    pub fn is_successful(&self) -> bool {
        self.response_status.is_completed()
            && self.status_code.is_some_and(|status| status.is_success())
    }

    /// Converts the envelope into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecutionError`] of any non-completed execution.
    pub fn into_result(self) -> Result<Option<T>, ExecutionError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn not_found() -> RestResponse<String> {
        RestResponse::assemble(
            ResponseStatus::Completed,
            Some(StatusCode::NOT_FOUND),
            HeaderMap::new(),
            Some(Bytes::new()),
            None,
            None,
        )
    }

    #[test]
    fn test_completed_response_has_no_error() {
        let response = RestResponse::assemble(
            ResponseStatus::Completed,
            Some(StatusCode::OK),
            HeaderMap::new(),
            Some(Bytes::from_static(b"Works!")),
            Some("Works!".to_string()),
            Some(ExecutionError::Aborted),
        );

        assert!(response.error().is_none());
        assert!(response.is_successful());
        assert_eq!(response.content_text().as_deref(), Some("Works!"));
        assert_eq!(response.into_result().expect("completed"), Some("Works!".to_string()));
    }

    #[test]
    fn test_failed_response_drops_data() {
        let response = RestResponse::assemble(
            ResponseStatus::Error,
            Some(StatusCode::OK),
            HeaderMap::new(),
            Some(Bytes::new()),
            Some("ignored".to_string()),
            Some(ExecutionError::Hook {
                message: "boom".to_string(),
            }),
        );

        assert!(response.data().is_none());
        assert_eq!(response.status_code(), Some(StatusCode::OK));
        insta::assert_snapshot!(response.error_message().unwrap_or_default(), @"boom");
    }

    #[test]
    fn test_timed_out_response_has_no_content() {
        let response: RestResponse<String> = RestResponse::assemble(
            ResponseStatus::TimedOut,
            Some(StatusCode::OK),
            HeaderMap::new(),
            Some(Bytes::from_static(b"late")),
            None,
            Some(ExecutionError::Timeout {
                timeout: Duration::from_millis(200),
            }),
        );

        assert!(response.status_code().is_none());
        assert!(response.content().is_none());
        assert!(!response.is_successful());
        assert!(matches!(
            response.into_result(),
            Err(ExecutionError::Timeout { .. })
        ));
    }

    #[test]
    fn test_not_found_is_completed_but_not_successful() {
        let response = not_found();

        assert_eq!(response.response_status(), ResponseStatus::Completed);
        assert!(!response.is_successful());
        assert!(response.error_message().is_none());
        assert_eq!(response.into_result().expect("completed"), None);
    }
}
