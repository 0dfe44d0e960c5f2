//! Test harness running a server on a random local port.
//!
//! - [`TestClient<T>`]: starts a [`TestServer`], waits until it is ready and
//!   derefs to a [`RestClient`] pointing at it
//! - [`TestServer`]: what the harness needs from a server (axum, warp, hyper...)
//! - [`TestServerConfig`]: client configuration and readiness backoff
//! - [`TestAppError`]: startup failures
//!
//! ```rust,no_run
//! use restexec_core::test_client::{TestClient, TestServer};
//! use restexec_core::{ResponseStatus, RestRequest};
//! use std::net::TcpListener;
//!
//! #[derive(Debug)]
//! struct MyTestServer;
//!
//! impl TestServer for MyTestServer {
//!     async fn launch(&self, listener: TcpListener) {
//!         listener.set_nonblocking(true).expect("set non-blocking");
//!         let _listener = tokio::net::TcpListener::from_std(listener).expect("valid listener");
//!         // serve here
//!     }
//! }
//!
//! #[tokio::test]
//! async fn test_my_api() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TestClient::start(MyTestServer).await?;
//!
//!     let response = client.execute_raw(RestRequest::get("/api/users")).await;
//!     assert_eq!(response.response_status(), ResponseStatus::Completed);
//!
//!     Ok(())
//! }
//! ```

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::{debug, error};

use crate::RestClient;

mod error;
pub use self::error::*;

mod test_server;
pub use self::test_server::*;

/// A running test server and a [`RestClient`] bound to it.
///
/// The server task is aborted when the `TestClient` is dropped.
#[derive(Debug, derive_more::Deref, derive_more::DerefMut)]
pub struct TestClient<T> {
    local_addr: SocketAddr,
    #[deref]
    #[deref_mut]
    client: RestClient,
    handle: Option<tokio::task::JoinHandle<()>>,
    test_server: Arc<T>,
}

impl<T> TestClient<T>
where
    T: TestServer + Send + Sync + 'static,
{
    /// Starts the server and waits until it is healthy.
    ///
    /// 1. Binds a random localhost port
    /// 2. Launches the server in a background task
    /// 3. Builds a [`RestClient`] targeting that port
    /// 4. Polls [`TestServer::is_healthy`] with exponential backoff
    ///
    /// # Errors
    ///
    /// Fails if the port cannot be bound, the client cannot be built, or the
    /// server is still unhealthy after the configured retries.
    pub async fn start(test_server: T) -> Result<Self, TestAppError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;

        let test_server = Arc::new(test_server);
        let handle = tokio::spawn({
            let server = Arc::clone(&test_server);
            async move {
                server.launch(listener).await;
            }
        });

        let TestServerConfig {
            client,
            min_backoff_delay,
            max_backoff_delay,
            backoff_jitter,
            max_retry_attempts,
        } = test_server.config();

        let client = client.unwrap_or_else(RestClient::builder);
        let client = client.with_port(local_addr.port()).build()?;

        let mut backoff = ExponentialBuilder::default()
            .with_min_delay(min_backoff_delay)
            .with_max_delay(max_backoff_delay)
            .with_max_times(max_retry_attempts);
        if backoff_jitter {
            backoff = backoff.with_jitter();
        }

        if !Self::wait_for_health(&test_server, &client, local_addr, backoff).await {
            handle.abort();
            return Err(TestAppError::UnhealthyServer {
                attempts: max_retry_attempts,
                max_backoff_delay,
            });
        }

        Ok(Self {
            local_addr,
            client,
            handle: Some(handle),
            test_server,
        })
    }

    async fn wait_for_health(
        test_server: &Arc<T>,
        client: &RestClient,
        local_addr: SocketAddr,
        backoff: ExponentialBuilder,
    ) -> bool {
        let health_check = || async {
            match test_server.is_healthy(client).await {
                Some(true) => {
                    debug!("🟢 server healthy");
                    Ok(())
                }
                Some(false) => {
                    debug!("🟠 server not yet healthy, retrying");
                    Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Server not healthy yet",
                    ))
                }
                None => {
                    debug!("❓wait until a connection can be established with the server");
                    tokio::net::TcpStream::connect(local_addr)
                        .await
                        .map(drop)
                        .inspect_err(|err| error!(?err, %local_addr, "cannot connect to the server"))
                }
            }
        };

        health_check.retry(backoff).await.is_ok()
    }

    /// Address the server listens on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The running server.
    pub fn server(&self) -> &T {
        &self.test_server
    }

    /// A client for the server with a different configuration.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be built.
    pub fn client_with(
        &self,
        builder: crate::RestClientBuilder,
    ) -> Result<RestClient, TestAppError> {
        let client = builder.with_port(self.local_addr.port()).build()?;
        Ok(client)
    }
}

impl<T> Drop for TestClient<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::routing::get;

    use super::*;
    use crate::{ResponseStatus, RestRequest};

    #[derive(Debug)]
    struct EmptyOkServer;

    impl TestServer for EmptyOkServer {
        async fn launch(&self, listener: TcpListener) {
            listener.set_nonblocking(true).expect("set non-blocking");
            let listener = tokio::net::TcpListener::from_std(listener).expect("valid listener");
            let router = Router::new().fallback(get(|| async {}));
            axum::serve(listener, router).await.expect("server runs");
        }
    }

    #[derive(Debug)]
    struct NeverHealthy;

    impl TestServer for NeverHealthy {
        async fn launch(&self, _listener: TcpListener) {}

        async fn is_healthy(&self, _client: &RestClient) -> Option<bool> {
            Some(false)
        }

        fn config(&self) -> TestServerConfig {
            TestServerConfig {
                min_backoff_delay: Duration::from_millis(1),
                max_backoff_delay: Duration::from_millis(2),
                backoff_jitter: false,
                max_retry_attempts: 2,
                ..TestServerConfig::default()
            }
        }
    }

    #[tokio::test]
    async fn test_start_binds_client_to_server_port() {
        let client = TestClient::start(EmptyOkServer).await.expect("server starts");

        assert_eq!(
            client.base_uri().port_u16(),
            Some(client.local_addr().port())
        );

        for _ in 0..2 {
            let response = client.execute_raw(RestRequest::get("/anything")).await;
            assert_eq!(response.response_status(), ResponseStatus::Completed);
            assert_eq!(response.status_code(), Some(http::StatusCode::OK));
        }
    }

    #[tokio::test]
    async fn test_start_fails_when_server_never_healthy() {
        let result = TestClient::start(NeverHealthy).await;

        assert!(matches!(
            result,
            Err(TestAppError::UnhealthyServer { attempts: 2, .. })
        ));
    }
}
