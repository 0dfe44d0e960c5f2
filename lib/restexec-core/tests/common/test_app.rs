#![allow(
    clippy::missing_errors_doc,
    dead_code,
    missing_docs,
    clippy::expect_used
)]
use std::net::TcpListener;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use restexec_core::test_client::{TestClient, TestServer, TestServerConfig};
use restexec_core::{RestClient, RestRequest};

/// Delay of the `/timeout` endpoint.
pub const SLOW_ENDPOINT_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "Message")]
    pub message: String,
}

impl Response {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EchoParams {
    msg: String,
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    code: u16,
}

async fn success() -> Json<Response> {
    Json(Response::new("Works!"))
}

async fn slow() -> Json<Response> {
    tokio::time::sleep(SLOW_ENDPOINT_DELAY).await;
    Json(Response::new("Works!"))
}

async fn echo(Query(EchoParams { msg }): Query<EchoParams>) -> String {
    msg
}

async fn echo_json(Json(body): Json<Response>) -> Json<Response> {
    Json(body)
}

async fn status(Query(StatusParams { code }): Query<StatusParams>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn malformed() -> impl IntoResponse {
    ([(CONTENT_TYPE, "application/json")], "{not json")
}

async fn error_body() -> impl IntoResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(Response::new("invalid observation")),
    )
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/success", get(success))
        .route("/timeout", get(slow).put(slow).post(slow))
        .route("/echo", get(echo).post(echo_json))
        .route("/status", get(status))
        .route("/malformed", get(malformed))
        .route("/error-body", get(error_body))
}

#[derive(Debug)]
pub struct AppTestServer;

impl TestServer for AppTestServer {
    async fn launch(&self, listener: TcpListener) {
        listener.set_nonblocking(true).expect("set non-blocking");
        let listener = tokio::net::TcpListener::from_std(listener).expect("valid listener");
        info!(?listener, "launching server");
        axum::serve(listener, router())
            .await
            .expect("server launched");
    }

    async fn is_healthy(&self, client: &RestClient) -> Option<bool> {
        let response = client.execute_raw(RestRequest::get("/health")).await;
        Some(response.is_successful())
    }

    fn config(&self) -> TestServerConfig {
        TestServerConfig {
            client: Some(RestClient::builder()),
            ..Default::default()
        }
    }
}

#[derive(Debug, derive_more::Deref, derive_more::DerefMut)]
pub struct TestApp {
    #[deref]
    #[deref_mut]
    client: TestClient<AppTestServer>,
}

impl TestApp {
    pub async fn start() -> anyhow::Result<Self> {
        let client = TestClient::start(AppTestServer).await?;
        Ok(Self { client })
    }
}
