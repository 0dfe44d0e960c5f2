use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use http::uri::{PathAndQuery, Scheme};
use http::{HeaderMap, Uri};

use super::decoder::{ContentDecoder, Decoder};
use super::governor::DEFAULT_CANCEL_GRACE;
use super::transport::{ReqwestTransport, Transport};
use super::{RestClient, RestClientError};

/// Builder for [`RestClient`] instances.
///
/// # Default Configuration
///
/// - **Scheme**: HTTP
/// - **Host**: 127.0.0.1
/// - **Port**: 80
/// - **Base path**: none
/// - **Timeout**: none
/// - **Cancel grace**: [`DEFAULT_CANCEL_GRACE`]
/// - **Transport**: [`ReqwestTransport`] with a default `reqwest::Client`
/// - **Decoder**: [`ContentDecoder`]
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use http::uri::Scheme;
/// use restexec_core::RestClient;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RestClient::builder()
///     .with_scheme(Scheme::HTTPS)
///     .with_host("api.example.com")
///     .with_port(443)
///     .with_base_path("/v1")?
///     .with_timeout(Duration::from_secs(2))
///     .with_default_header("Accept", "application/json")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestClientBuilder<T = ReqwestTransport, D = ContentDecoder> {
    transport: T,
    decoder: D,
    scheme: Scheme,
    host: String,
    port: u16,
    base_path: Option<PathAndQuery>,
    timeout: Option<Duration>,
    default_headers: HeaderMap,
    cancel_grace: Duration,
}

impl<T, D> RestClientBuilder<T, D>
where
    T: Transport,
    D: Decoder,
{
    /// Builds the [`RestClient`].
    ///
    /// # Errors
    ///
    /// Fails if the base URI cannot be assembled from the scheme, host, port and base path.
    pub fn build(self) -> Result<RestClient<T, D>, RestClientError> {
        let Self {
            transport,
            decoder,
            scheme,
            host,
            port,
            base_path,
            timeout,
            default_headers,
            cancel_grace,
        } = self;

        let builder = Uri::builder()
            .scheme(scheme)
            .authority(format!("{host}:{port}"));
        let builder = if let Some(path) = &base_path {
            builder.path_and_query(path.path())
        } else {
            builder.path_and_query("/")
        };
        let base_uri = builder.build()?;

        Ok(RestClient {
            transport: Arc::new(transport),
            decoder: Arc::new(decoder),
            base_uri,
            default_timeout: timeout,
            default_headers,
            cancel_grace,
        })
    }
}

impl<T, D> RestClientBuilder<T, D> {
    /// Sets the scheme of the base URI.
    ///
    /// # Default
    ///
    /// If not specified, defaults to `http`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use http::uri::Scheme;
    /// use restexec_core::RestClient;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = RestClient::builder()
    ///     .with_scheme(Scheme::HTTPS)
    ///     .with_host("api.example.com")
    ///     .with_port(443)
    ///     .build()?;
    ///
    /// assert_eq!(client.base_uri().scheme(), Some(&Scheme::HTTPS));
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the host name or IP address of the server.
    ///
    /// # Default
    ///
    /// If not specified, defaults to `127.0.0.1`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use restexec_core::RestClient;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = RestClient::builder()
    ///     .with_host("api.example.com")
    ///     .build()?;
    ///
    /// assert_eq!(client.base_uri().host(), Some("api.example.com"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port of the server.
    ///
    /// # Default
    ///
    /// If not specified, defaults to `80`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use restexec_core::RestClient;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = RestClient::builder()
    ///     .with_host("localhost")
    ///     .with_port(8080)
    ///     .build()?;
    ///
    /// assert_eq!(client.base_uri().port_u16(), Some(8080));
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the path prepended to every request path.
    ///
    /// # Errors
    ///
    /// Returns [`RestClientError::InvalidBasePath`] if the path is not a valid URI path.
    pub fn with_base_path<P>(mut self, base_path: P) -> Result<Self, RestClientError>
    where
        P: TryInto<PathAndQuery>,
        P::Error: Debug + 'static,
    {
        let base_path = base_path
            .try_into()
            .map_err(|err| RestClientError::InvalidBasePath {
                error: format!("{err:?}"),
            })?;
        self.base_path = Some(base_path);
        Ok(self)
    }

    /// Sets scheme, host, port and base path from an absolute URL.
    ///
    /// Without an explicit port, the default port of the scheme is used.
    ///
    /// # Errors
    ///
    /// Fails if the URL cannot be parsed or has no host.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, RestClientError> {
        let uri = base_url.parse::<Uri>()?;
        let Some(host) = uri.host() else {
            return Err(RestClientError::MissingHost {
                url: base_url.to_string(),
            });
        };

        let scheme = uri.scheme().cloned().unwrap_or(Scheme::HTTP);
        let port = uri
            .port_u16()
            .unwrap_or(if scheme == Scheme::HTTPS { 443 } else { 80 });

        self.host = host.to_string();
        self.port = port;
        self.scheme = scheme;
        self.base_path = match uri.path() {
            "" | "/" => None,
            path => Some(path.parse().map_err(|err| RestClientError::InvalidBasePath {
                error: format!("{err:?}"),
            })?),
        };
        Ok(self)
    }

    /// Default timeout for requests that do not set their own, zero meaning none.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a header sent with every request, unless the request overrides it.
    ///
    /// # Errors
    ///
    /// Fails on an invalid header name or value.
    pub fn with_default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, RestClientError> {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes())?;
        let value = HeaderValue::from_str(value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Time granted to the transport to acknowledge a cancellation.
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    /// Replaces the transport.
    pub fn with_transport<T2>(self, transport: T2) -> RestClientBuilder<T2, D> {
        let Self {
            decoder,
            scheme,
            host,
            port,
            base_path,
            timeout,
            default_headers,
            cancel_grace,
            ..
        } = self;

        RestClientBuilder {
            transport,
            decoder,
            scheme,
            host,
            port,
            base_path,
            timeout,
            default_headers,
            cancel_grace,
        }
    }

    /// Replaces the content decoder.
    pub fn with_decoder<D2>(self, decoder: D2) -> RestClientBuilder<T, D2> {
        let Self {
            transport,
            scheme,
            host,
            port,
            base_path,
            timeout,
            default_headers,
            cancel_grace,
            ..
        } = self;

        RestClientBuilder {
            transport,
            decoder,
            scheme,
            host,
            port,
            base_path,
            timeout,
            default_headers,
            cancel_grace,
        }
    }
}

impl<D> RestClientBuilder<ReqwestTransport, D> {
    /// Uses a preconfigured `reqwest::Client` (TLS, proxies, connection pool...).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.transport = ReqwestTransport::new(client);
        self
    }
}

impl Default for RestClientBuilder {
    fn default() -> Self {
        Self {
            transport: ReqwestTransport::default(),
            decoder: ContentDecoder,
            scheme: Scheme::HTTP,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST).to_string(),
            port: 80,
            base_path: None,
            timeout: None,
            default_headers: HeaderMap::new(),
            cancel_grace: DEFAULT_CANCEL_GRACE,
        }
    }
}
