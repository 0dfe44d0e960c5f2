//! # Restexec Core
//!
//! Asynchronous HTTP request execution with a uniform response envelope.
//!
//! Every execution resolves to a [`RestResponse`], never to an error: network
//! failures, timeouts, caller aborts, hook faults and decoding faults are all
//! captured inside the envelope and classified by [`ResponseStatus`].
//!
//! ```text
//! RestRequest ─▶ Transport ─▶ TimeoutGovernor ─▶ hooks ─▶ Decoder ─▶ RestResponse<T>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use restexec_core::{ResponseStatus, RestClient, RestRequest};
//! # use serde::Deserialize;
//! # #[derive(Deserialize)]
//! # struct Greeting { #[serde(rename = "Message")] message: String }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RestClient::builder()
//!     .with_host("localhost")
//!     .with_port(8080)
//!     .build()?;
//!
//! let request = RestRequest::get("/success").with_timeout(Duration::from_millis(200));
//! let response = client.execute::<Greeting>(request).await;
//!
//! match response.response_status() {
//!     ResponseStatus::Completed => {
//!         // Completed covers any HTTP status code, 404 included
//!         println!("{:?} {:?}", response.status_code(), response.data().map(|it| &it.message));
//!     }
//!     ResponseStatus::TimedOut => println!("too slow"),
//!     _ => println!("failed: {:?}", response.error_message()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Response status
//!
//! | Outcome                                   | [`ResponseStatus`] | data              |
//! |-------------------------------------------|--------------------|-------------------|
//! | response received and processed, any code | `Completed`       | if decoded        |
//! | transport failure                          | `Error`           | absent            |
//! | hook returned an error or panicked         | `Error`           | absent            |
//! | body could not be decoded                  | `Error`           | absent            |
//! | deadline elapsed                           | `TimedOut`        | absent            |
//! | caller cancelled the abort token           | `Aborted`         | absent            |
//!
//! Hook panics are captured only when the binary unwinds on panic; with
//! `panic = "abort"` a panicking hook aborts the process.
//!
//! ## Pre-deserialization hooks
//!
//! Hooks see (and may rewrite) the raw response before decoding. The message
//! of a failing hook is reported verbatim:
//!
//! ```rust,no_run
//! use restexec_core::{RawResponse, RestClient, RestRequest};
//!
//! # async fn example(client: RestClient) {
//! let request = RestRequest::get("/success").add_hook(|_raw: &mut RawResponse| Err("boom"));
//! let response = client.execute_raw(request).await;
//! assert_eq!(response.error_message().as_deref(), Some("boom"));
//! # }
//! ```
//!
//! ## Testing against a local server
//!
//! The [`test_client`] module starts a server on a random local port and
//! hands out a [`RestClient`] pointing at it.
//!
//! ## Features
//!
//! - `xml`: decode `application/xml`, `text/xml` and `+xml` bodies with `serde-xml-rs`.

mod client;

pub mod test_client;

pub use self::client::{
    ContentDecoder, DEFAULT_CANCEL_GRACE, DecodeError, Decoder, ExecutionError, GovernedOutcome,
    HookError, PreDeserializationHook, RawResponse, ReqwestTransport, RequestBody, ResponseStatus,
    RestClient, RestClientBuilder, RestClientError, RestRequest, RestResponse, TimeoutGovernor,
    Transport, TransportOutcome, TransportRequest, classify,
};
