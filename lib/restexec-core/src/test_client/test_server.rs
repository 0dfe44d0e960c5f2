use std::future::Future;
use std::net::TcpListener;
use std::time::Duration;

use crate::{RestClient, RestClientBuilder};

/// A server that a [`TestClient`](super::TestClient) can start and health-check.
///
/// # Required Methods
///
/// - [`launch`](TestServer::launch): Starts the server with the provided `TcpListener`
///
/// # Optional Methods
///
/// - [`is_healthy`](TestServer::is_healthy): Checks if the server is ready to accept requests
/// - [`config`](TestServer::config): Provides configuration for the test framework
///
/// # Example
///
/// ```rust,no_run
/// use restexec_core::test_client::{TestServer, TestServerConfig};
/// use restexec_core::{RestClient, RestRequest};
/// use std::net::TcpListener;
///
/// #[derive(Debug)]
/// struct MyTestServer;
///
/// impl TestServer for MyTestServer {
///     async fn launch(&self, listener: TcpListener) {
///         listener.set_nonblocking(true).expect("set non-blocking");
///         let tokio_listener = tokio::net::TcpListener::from_std(listener)
///             .expect("valid listener");
///         // axum::serve(tokio_listener, app).await.expect("server started");
///     }
///
///     async fn is_healthy(&self, client: &RestClient) -> Option<bool> {
///         let response = client.execute_raw(RestRequest::get("/health")).await;
///         Some(response.is_successful())
///     }
/// }
/// ```
///
/// # Health Checking
///
/// - Return `Some(true)` if the server is ready to accept requests
/// - Return `Some(false)` if the server is not ready
/// - Return `None` to use the default TCP connection test
pub trait TestServer {
    /// Launches the server on a listener bound to a random local port.
    ///
    /// The listener is a blocking `std` listener; switch it to non-blocking
    /// before handing it to tokio.
    fn launch(&self, listener: TcpListener) -> impl Future<Output = ()> + Send;

    /// Reports whether the server is ready, `None` meaning "check the TCP port".
    fn is_healthy(&self, _client: &RestClient) -> impl Future<Output = Option<bool>> + Send {
        std::future::ready(None)
    }

    /// Configuration of the client and of the readiness wait.
    fn config(&self) -> TestServerConfig {
        TestServerConfig::default()
    }
}

/// Configuration of the readiness wait of a [`TestClient`](super::TestClient).
///
/// The health check is retried with an exponential backoff between
/// `min_backoff_delay` and `max_backoff_delay`, at most `max_retry_attempts` times.
#[derive(Debug, Clone)]
pub struct TestServerConfig {
    /// Client configuration; the port is always replaced by the one of the server.
    pub client: Option<RestClientBuilder>,

    /// First delay between two health checks.
    pub min_backoff_delay: Duration,

    /// Upper bound of the delay between two health checks.
    pub max_backoff_delay: Duration,

    /// Adds random jitter to the backoff delays.
    pub backoff_jitter: bool,

    /// Health checks tried before giving up.
    pub max_retry_attempts: usize,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            client: None,
            min_backoff_delay: Duration::from_millis(10),
            max_backoff_delay: Duration::from_secs(1),
            backoff_jitter: true,
            max_retry_attempts: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct MockServer {
        healthy: Option<bool>,
    }

    impl TestServer for MockServer {
        async fn launch(&self, listener: TcpListener) {
            drop(listener);
        }

        async fn is_healthy(&self, _client: &RestClient) -> Option<bool> {
            self.healthy
        }
    }

    #[test]
    fn test_test_server_config_default() {
        let config = TestServerConfig::default();

        assert!(config.client.is_none());
        insta::assert_debug_snapshot!(
            (config.min_backoff_delay, config.max_backoff_delay, config.max_retry_attempts),
            @r"
        (
            10ms,
            1s,
            10,
        )
        "
        );
    }

    #[test]
    fn test_test_server_config_custom() {
        let config = TestServerConfig {
            client: Some(RestClient::builder().with_host("localhost")),
            max_retry_attempts: 3,
            ..TestServerConfig::default()
        };

        assert!(config.client.is_some());
        assert_eq!(config.max_retry_attempts, 3);
    }

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let client = RestClient::builder().build().expect("valid client");

        for healthy in [Some(true), Some(false), None] {
            let server = MockServer { healthy };
            assert_eq!(server.is_healthy(&client).await, healthy);
        }
    }

    #[test]
    fn test_default_config_is_used_by_trait() {
        let server = MockServer { healthy: None };

        assert_eq!(server.config().max_retry_attempts, 10);
    }
}
