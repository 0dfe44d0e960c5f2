use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, Uri};

mod body;
pub use self::body::RequestBody;

mod builder;
pub use self::builder::RestClientBuilder;

mod decoder;
pub use self::decoder::{ContentDecoder, DecodeError, Decoder};

mod deserialize;
pub use self::deserialize::{HookError, PreDeserializationHook};

mod error;
pub use self::error::{ExecutionError, RestClientError};

mod execution;

mod governor;
pub use self::governor::{DEFAULT_CANCEL_GRACE, GovernedOutcome, TimeoutGovernor};

mod request;
pub use self::request::RestRequest;

mod response;
pub use self::response::RestResponse;

mod status;
pub use self::status::{ResponseStatus, classify};

mod transport;
pub use self::transport::{
    RawResponse, ReqwestTransport, Transport, TransportOutcome, TransportRequest,
};


/// Asynchronous HTTP client executing [`RestRequest`]s into [`RestResponse`] envelopes.
///
/// Each execution goes through the same pipeline: the request is resolved
/// against the base URL, sent through the [`Transport`] under a
/// [`TimeoutGovernor`], then pre-deserialization hooks run and the
/// [`Decoder`] turns the body into the requested type.
///
/// The client is immutable once built and cheap to clone; clones share the
/// transport and the decoder.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use restexec_core::{RestClient, RestRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RestClient::builder()
///     .with_host("api.example.com")
///     .with_base_path("/v1")?
///     .with_timeout(Duration::from_secs(5))
///     .build()?;
///
/// let response = client.execute_raw(RestRequest::get("/health")).await;
/// println!("{}", response.response_status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RestClient<T = ReqwestTransport, D = ContentDecoder> {
    transport: Arc<T>,
    decoder: Arc<D>,
    base_uri: Uri,
    default_timeout: Option<Duration>,
    default_headers: HeaderMap,
    cancel_grace: Duration,
}

impl<T, D> Clone for RestClient<T, D> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            decoder: Arc::clone(&self.decoder),
            base_uri: self.base_uri.clone(),
            default_timeout: self.default_timeout,
            default_headers: self.default_headers.clone(),
            cancel_grace: self.cancel_grace,
        }
    }
}

// Create
impl RestClient {
    /// Starts the configuration of a client.
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::default()
    }
}

// Accessors
impl<T, D> RestClient<T, D> {
    /// The base URI requests are resolved against.
    pub fn base_uri(&self) -> &Uri {
        &self.base_uri
    }

    /// Timeout applied to requests that do not set their own.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// The transport executing the exchanges.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
