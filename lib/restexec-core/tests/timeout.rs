#![allow(missing_docs)]

use std::time::{Duration, Instant};

use restexec_core::{ExecutionError, RawResponse, ResponseStatus, RestClient, RestRequest};
use rstest::rstest;
use tokio_util::sync::CancellationToken;

mod common;
pub use self::common::*;

const TIMEOUT: Duration = Duration::from_millis(200);
const MAX_WALL_TIME: Duration = Duration::from_millis(500);

#[rstest]
#[case::get(RestRequest::get("/timeout"))]
#[case::put(RestRequest::put("/timeout"))]
#[case::post(RestRequest::post("/timeout").text("Body_Content"))]
#[tokio::test]
async fn test_can_timeout_async(
    #[future] app: TestApp,
    #[case] request: RestRequest,
) -> anyhow::Result<()> {
    let app = app.await;

    let started = Instant::now();
    let response = app
        .execute::<Response>(request.with_timeout(TIMEOUT))
        .await;
    let elapsed = started.elapsed();

    assert_eq!(response.response_status(), ResponseStatus::TimedOut);
    assert!(elapsed < MAX_WALL_TIME, "took {elapsed:?}");
    assert!(response.data().is_none());
    assert!(response.status_code().is_none());
    assert!(matches!(
        response.error(),
        Some(ExecutionError::Timeout { timeout }) if *timeout == TIMEOUT
    ));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_timeout_skips_hooks(#[future] app: TestApp) -> anyhow::Result<()> {
    let app = app.await;

    let request = RestRequest::get("/timeout")
        .with_timeout(TIMEOUT)
        .add_hook(|_raw: &mut RawResponse| Err("should not run"));
    let response = app.execute_raw(request).await;

    assert_eq!(response.response_status(), ResponseStatus::TimedOut);
    insta::assert_snapshot!(response.error_message().unwrap_or_default(), @"Request timed out after 200ms");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_client_default_timeout(#[future] app: TestApp) -> anyhow::Result<()> {
    let app = app.await;
    let client = app.client_with(RestClient::builder().with_timeout(TIMEOUT))?;

    let started = Instant::now();
    let response = client.execute_raw(RestRequest::get("/timeout")).await;

    assert_eq!(response.response_status(), ResponseStatus::TimedOut);
    assert!(started.elapsed() < MAX_WALL_TIME);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_timeout_does_not_affect_fast_endpoint(#[future] app: TestApp) -> anyhow::Result<()> {
    let app = app.await;

    let request = RestRequest::get("/success").with_timeout(Duration::from_secs(5));
    let response = app.execute::<Response>(request).await;

    assert_eq!(response.response_status(), ResponseStatus::Completed);
    assert_eq!(response.data(), Some(&Response::new("Works!")));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn test_can_abort_async(#[future] app: TestApp) -> anyhow::Result<()> {
    let app = app.await;
    let abort = CancellationToken::new();

    tokio::spawn({
        let abort = abort.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            abort.cancel();
        }
    });

    let started = Instant::now();
    let request = RestRequest::get("/timeout").with_abort_token(abort);
    let response = app.execute::<Response>(request).await;

    assert_eq!(response.response_status(), ResponseStatus::Aborted);
    assert!(started.elapsed() < MAX_WALL_TIME);
    assert!(matches!(response.error(), Some(ExecutionError::Aborted)));
    Ok(())
}
