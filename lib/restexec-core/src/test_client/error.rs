use std::time::Duration;

use crate::RestClientError;

/// Errors raised while starting a [`TestClient`](super::TestClient).
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TestAppError {
    /// The listener could not be bound or inspected.
    #[display("I/O error: {_0}")]
    IoError(tokio::io::Error),

    /// The client for the server could not be built.
    #[display("Client error: {_0}")]
    ClientError(RestClientError),

    /// The server never passed its health check.
    #[from(ignore)]
    #[display("Server failed to become healthy after {attempts} attempts")]
    UnhealthyServer {
        /// Health checks tried.
        attempts: usize,
        /// Upper bound of the delay between two health checks.
        max_backoff_delay: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_app_error_display() {
        let unhealthy_error = TestAppError::UnhealthyServer {
            attempts: 5,
            max_backoff_delay: Duration::from_secs(1),
        };

        insta::assert_snapshot!(unhealthy_error, @"Server failed to become healthy after 5 attempts");
    }

    #[test]
    fn test_test_app_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "Address in use");

        let test_error: TestAppError = io_error.into();

        assert!(matches!(
            &test_error,
            TestAppError::IoError(error) if error.kind() == std::io::ErrorKind::AddrInUse
        ));
    }

    #[test]
    fn test_test_app_error_from_client_error() {
        let client_error = RestClientError::InvalidBasePath {
            error: "invalid".to_string(),
        };

        let test_error: TestAppError = client_error.into();

        insta::assert_snapshot!(test_error, @"Client error: Invalid base path: invalid");
    }
}
