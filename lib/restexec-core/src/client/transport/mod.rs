//! Transport collaborator used by the execution pipeline.
//!
//! A [`Transport`] receives a fully resolved [`TransportRequest`] and a
//! [`CancellationToken`], performs the network exchange, and always answers
//! with a [`RawResponse`]. Network failures are reported through
//! [`TransportOutcome::Failed`], never as an error value or a panic.

use std::fmt::Debug;
use std::future::Future;

use bytes::Bytes;
use headers::{ContentType, HeaderMapExt};
use http::{HeaderMap, Method, StatusCode};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

mod reqwest_transport;
pub use self::reqwest_transport::ReqwestTransport;

/// Performs the actual network I/O of an execution.
///
/// Implementations must observe the cancellation token at their own I/O
/// boundaries: once it is cancelled, pending work is abandoned and
/// [`RawResponse::canceled`] is returned promptly.
///
/// No retries happen at this layer.
pub trait Transport: Debug + Send + Sync + 'static {
    /// Sends the request and waits for the complete response body.
    fn send(
        &self,
        request: TransportRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = RawResponse> + Send;
}

/// A request resolved against the client configuration, ready to be sent.
#[derive(derive_more::Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: Url,
    /// Client default headers merged with the request headers.
    pub headers: HeaderMap,
    /// Request payload.
    #[debug(ignore)]
    pub body: Option<Bytes>,
    /// Instant at which the timeout governor gives up on this exchange, if any.
    ///
    /// Transports able to enforce a deadline natively may use it; the governor
    /// enforces it regardless.
    pub deadline: Option<Instant>,
}

/// How the transport exchange ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// A complete response (status, headers and body) was received.
    Received,
    /// The exchange failed at the network layer.
    Failed {
        /// Description of the failure reported by the transport.
        message: String,
    },
    /// The exchange was abandoned after its cancellation token fired.
    Canceled,
}

/// Untyped result of one transport exchange, prior to any decoding.
///
/// Pre-deserialization hooks receive it mutably, so they can inspect or rewrite
/// the status, headers, or body before the decoder runs.
#[derive(derive_more::Debug, Clone)]
pub struct RawResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    #[debug(ignore)]
    body: Bytes,
    outcome: TransportOutcome,
}

impl RawResponse {
    /// A response that was fully received.
    pub fn received(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status: Some(status),
            headers,
            body,
            outcome: TransportOutcome::Received,
        }
    }

    /// A network-level failure with its description.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            outcome: TransportOutcome::Failed {
                message: message.into(),
            },
        }
    }

    /// An exchange abandoned on cancellation.
    pub fn canceled() -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            outcome: TransportOutcome::Canceled,
        }
    }

    /// The status code, when a response head was received.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Replaces the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replaces the raw response body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// The declared `Content-Type`, if present and parseable.
    pub fn content_type(&self) -> Option<mime::Mime> {
        self.headers.typed_get::<ContentType>().map(mime::Mime::from)
    }

    /// How the exchange ended.
    pub fn outcome(&self) -> &TransportOutcome {
        &self.outcome
    }

    pub(in crate::client) fn into_parts(self) -> (Option<StatusCode>, HeaderMap, Option<Bytes>) {
        let content = (self.outcome == TransportOutcome::Received).then_some(self.body);
        (self.status, self.headers, content)
    }
}
