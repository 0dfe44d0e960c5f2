use headers::HeaderMapExt;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::body::RequestBody;
use super::decoder::Decoder;
use super::deserialize::{Decoding, DeserializationStage};
use super::governor::{GovernedOutcome, TimeoutGovernor};
use super::request::RestRequest;
use super::response::RestResponse;
use super::status::{ResponseStatus, classify, transport_fault};
use super::transport::{Transport, TransportOutcome, TransportRequest};
use super::{RestClient, RestClientError};

impl<T, D> RestClient<T, D>
where
    T: Transport,
    D: Decoder,
{
    /// Executes the request and decodes the body into `R`.
    ///
    /// Never fails: every fault is reported inside the returned [`RestResponse`].
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use restexec_core::{ResponseStatus, RestClient, RestRequest};
    /// # use serde::Deserialize;
    /// # #[derive(Deserialize)]
    /// # struct Response { #[serde(rename = "Message")] message: String }
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = RestClient::builder().with_port(8080).build()?;
    ///
    /// let response = client.execute::<Response>(RestRequest::get("/success")).await;
    /// if response.response_status() == ResponseStatus::Completed {
    ///     let message = response.data().map(|it| it.message.as_str());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<R>(&self, request: RestRequest) -> RestResponse<R>
    where
        R: DeserializeOwned,
    {
        self.run(request, true).await
    }

    /// Executes the request without decoding the body.
    ///
    /// Pre-deserialization hooks still run.
    pub async fn execute_raw(&self, request: RestRequest) -> RestResponse<()> {
        self.run::<()>(request, false).await
    }

    /// Executes the request as a `GET`.
    pub async fn execute_get<R>(&self, request: RestRequest) -> RestResponse<R>
    where
        R: DeserializeOwned,
    {
        self.execute(RestRequest {
            method: Method::GET,
            ..request
        })
        .await
    }

    /// Executes the request as a `POST`.
    pub async fn execute_post<R>(&self, request: RestRequest) -> RestResponse<R>
    where
        R: DeserializeOwned,
    {
        self.execute(RestRequest {
            method: Method::POST,
            ..request
        })
        .await
    }

    async fn run<R>(&self, request: RestRequest, typed: bool) -> RestResponse<R>
    where
        R: DeserializeOwned,
    {
        let RestRequest {
            method,
            path,
            query,
            headers,
            body,
            timeout,
            hooks,
            decode_error_body,
            abort,
        } = request;

        let transport_request =
            match self.resolve(method, &path, &query, &headers, body.as_ref()) {
                Ok(transport_request) => transport_request,
                Err(error) => {
                    warn!(%path, %error, "cannot resolve request");
                    return RestResponse::assemble(
                        ResponseStatus::Error,
                        None,
                        HeaderMap::new(),
                        None,
                        None,
                        Some(error.into()),
                    );
                }
            };

        let governor = TimeoutGovernor::new(timeout.or(self.default_timeout), self.cancel_grace);
        debug!(?transport_request, timeout = ?governor.timeout(), "sending request...");

        let outcome = governor
            .run(abort.as_ref(), |cancel, deadline| {
                let request = TransportRequest {
                    deadline,
                    ..transport_request
                };
                self.transport.send(request, cancel)
            })
            .await;

        let transport_fault = transport_fault(&outcome);
        let (outcome, data, stage_fault) = match outcome {
            GovernedOutcome::Finished(mut raw) if raw.outcome() != &TransportOutcome::Canceled => {
                let decoding = if typed {
                    Decoding::Typed {
                        error_body: decode_error_body,
                    }
                } else {
                    Decoding::Skip
                };
                let stage = DeserializationStage::new(&*self.decoder);
                match stage.run::<R>(&mut raw, hooks, decoding) {
                    Ok(data) => (GovernedOutcome::Finished(raw), data, None),
                    Err(fault) => (GovernedOutcome::Finished(raw), None, Some(fault)),
                }
            }
            interrupted => (interrupted, None, None),
        };

        let status = classify(&outcome, stage_fault.as_ref());
        let error = stage_fault.or(transport_fault);
        let (status_code, headers, content) = match outcome {
            GovernedOutcome::Finished(raw) => raw.into_parts(),
            GovernedOutcome::TimedOut(_) | GovernedOutcome::Aborted => {
                (None, HeaderMap::new(), None)
            }
        };
        debug!(%status, ?status_code, ?error, "...receiving response");

        RestResponse::assemble(status, status_code, headers, content, data, error)
    }

    fn resolve(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        headers: &IndexMap<String, String>,
        body: Option<&RequestBody>,
    ) -> Result<TransportRequest, RestClientError> {
        let url = build_url(&self.base_uri, path, query)?;

        let mut request_headers = self.default_headers.clone();
        if let Some(body) = body {
            request_headers.typed_insert(body.content_type.clone());
        }
        for (name, value) in headers {
            request_headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        Ok(TransportRequest {
            method,
            url,
            headers: request_headers,
            body: body.map(|it| it.data.clone()),
            deadline: None,
        })
    }
}

fn build_url(base_uri: &Uri, path: &str, query: &[(String, String)]) -> Result<Url, RestClientError> {
    let base_uri = base_uri.to_string();
    let url = format!(
        "{}/{}",
        base_uri.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = url.parse::<Url>()?;
    if url.host().is_none() {
        return Err(RestClientError::MissingHost {
            url: url.to_string(),
        });
    }

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
}
