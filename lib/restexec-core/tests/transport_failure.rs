#![allow(missing_docs)]

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use restexec_core::{
    ExecutionError, HookError, RawResponse, ResponseStatus, RestClient, RestRequest,
    TransportOutcome,
};

mod common;
use self::common::{Response, init_tracing};

fn closed_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

#[tokio::test]
async fn test_connection_refused_is_an_error() -> anyhow::Result<()> {
    init_tracing();
    let client = RestClient::builder().with_port(closed_port()?).build()?;

    let response = client.execute::<Response>(RestRequest::get("/success")).await;

    assert_eq!(response.response_status(), ResponseStatus::Error);
    assert!(response.status_code().is_none());
    assert!(response.content().is_none());
    assert!(matches!(
        response.error(),
        Some(ExecutionError::Transport { .. })
    ));
    assert!(response.error_message().is_some_and(|it| !it.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_hooks_see_transport_failure() -> anyhow::Result<()> {
    init_tracing();
    let client = RestClient::builder().with_port(closed_port()?).build()?;
    let failed = Arc::new(AtomicBool::new(false));

    let request = RestRequest::get("/success").add_hook({
        let failed = Arc::clone(&failed);
        move |raw: &mut RawResponse| {
            failed.store(
                matches!(raw.outcome(), TransportOutcome::Failed { .. }),
                Ordering::SeqCst,
            );
            Ok::<_, HookError>(())
        }
    });
    let response = client.execute_raw(request).await;

    assert_eq!(response.response_status(), ResponseStatus::Error);
    assert!(failed.load(Ordering::SeqCst));
    Ok(())
}
