use std::error::Error;

use reqwest::{Body, Request};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{RawResponse, Transport, TransportRequest};

/// [`Transport`] backed by a [`reqwest::Client`].
///
/// The deadline hint is not forwarded to reqwest: the timeout governor owns
/// the deadline, and a second timer inside reqwest would turn timeouts into
/// transport failures.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing reqwest client, keeping its pool and TLS settings.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn exchange(&self, request: TransportRequest) -> RawResponse {
        let TransportRequest {
            method,
            url,
            headers,
            body,
            deadline: _,
        } = request;

        let mut request = Request::new(method, url);
        *request.headers_mut() = headers;
        if let Some(body) = body {
            *request.body_mut() = Some(Body::from(body));
        }

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                let message = describe(&error);
                warn!(%message, "transport failure");
                return RawResponse::failed(message);
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        match response.bytes().await {
            Ok(body) => RawResponse::received(status, headers, body),
            Err(error) => {
                let message = describe(&error);
                warn!(%status, %message, "failed to read response body");
                RawResponse::failed(message)
            }
        }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest, cancel: CancellationToken) -> RawResponse {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("exchange dropped on cancellation");
                RawResponse::canceled()
            }
            response = self.exchange(request) => response,
        }
    }
}

// reqwest only displays the outermost layer, the interesting part is usually in the sources
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
