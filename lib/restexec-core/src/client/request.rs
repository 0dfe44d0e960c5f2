use std::time::Duration;

use headers::ContentType;
use http::Method;
use indexmap::IndexMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::RestClientError;
use super::body::RequestBody;
use super::deserialize::{HookError, PreDeserializationHook};
use super::transport::RawResponse;

/// Description of a single HTTP request, consumed by one execution.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use restexec_core::RestRequest;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let request = RestRequest::post("/users")
///     .with_query("dry_run", "true")
///     .with_header("X-Trace", "abc")
///     .json(&serde_json::json!({ "name": "Alice" }))?
///     .with_timeout(Duration::from_millis(500));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RestRequest {
    pub(super) method: Method,
    pub(super) path: String,
    pub(super) query: Vec<(String, String)>,
    pub(super) headers: IndexMap<String, String>,
    pub(super) body: Option<RequestBody>,
    pub(super) timeout: Option<Duration>,
    pub(super) hooks: Vec<PreDeserializationHook>,
    pub(super) decode_error_body: bool,
    pub(super) abort: Option<CancellationToken>,
}

// Create
impl RestRequest {
    /// Creates a request for `method` on `path`, relative to the client base URL.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: IndexMap::new(),
            body: None,
            timeout: None,
            hooks: Vec::new(),
            decode_error_body: false,
            abort: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Creates a `PATCH` request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Creates a `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }
}

// Parameters
impl RestRequest {
    /// Appends a query parameter; repeated names are all sent.
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Appends every field of a flat serializable value as query parameters.
    ///
    /// # Errors
    ///
    /// Fails if the value is not a flat structure of scalars.
    pub fn add_query_param<Q>(mut self, params: &Q) -> Result<Self, RestClientError>
    where
        Q: Serialize + ?Sized,
    {
        let encoded =
            serde_urlencoded::to_string(params).map_err(|e| RestClientError::SerializationError {
                message: format!("Failed to serialize query parameters: {e}"),
            })?;
        self.query.extend(
            url::form_urlencoded::parse(encoded.as_bytes())
                .map(|(name, value)| (name.into_owned(), value.into_owned())),
        );
        Ok(self)
    }

    /// Sets a header, replacing a previous value with the same name.
    ///
    /// Names are case-insensitive. Request headers override the client default headers.
    /// Invalid names or values are reported when the request is executed.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(header_key(name), value.into());
        self
    }

    /// Sets several headers, like repeated calls to [`Self::with_header`].
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (header_key(k), v.into())));
        self
    }
}

// Body
impl RestRequest {
    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be serialized as JSON.
    pub fn json<T>(mut self, t: &T) -> Result<Self, RestClientError>
    where
        T: Serialize + ?Sized,
    {
        self.body = Some(RequestBody::json(t)?);
        Ok(self)
    }

    /// Sets a form-urlencoded body.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be represented as a flat form.
    pub fn form<T>(mut self, t: &T) -> Result<Self, RestClientError>
    where
        T: Serialize + ?Sized,
    {
        self.body = Some(RequestBody::form(t)?);
        Ok(self)
    }

    /// Sets a `text/plain` body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(RequestBody::text(text));
        self
    }

    /// Sets a body made of raw bytes with an explicit content type.
    pub fn raw(mut self, data: impl Into<bytes::Bytes>, content_type: ContentType) -> Self {
        self.body = Some(RequestBody::raw(data, content_type));
        self
    }

    /// Sets a prepared body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }
}

// Execution settings
impl RestRequest {
    /// Overrides the client default timeout for this request.
    ///
    /// A zero duration disables the deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Registers a pre-deserialization hook.
    ///
    /// Hooks run in registration order on the raw response, before decoding.
    /// An `Err` (or a panic) aborts the stage and its message becomes the
    /// response error message.
    ///
    /// Panic capture relies on unwinding: in a binary built with
    /// `panic = "abort"` a panicking hook aborts the process.
    ///
    /// ```rust
    /// use restexec_core::{RawResponse, RestRequest};
    ///
    /// let request = RestRequest::get("/success").add_hook(|raw: &mut RawResponse| {
    ///     if raw.body().is_empty() {
    ///         return Err("empty body");
    ///     }
    ///     Ok(())
    /// });
    /// ```
    pub fn add_hook<F, E>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut RawResponse) -> Result<(), E> + Send + 'static,
        E: Into<HookError>,
    {
        self.hooks.push(PreDeserializationHook::new(hook));
        self
    }

    /// Also decodes the body of non-2xx responses.
    pub fn with_error_body_decoding(mut self) -> Self {
        self.decode_error_body = true;
        self
    }

    /// Binds the execution to a caller cancellation token.
    ///
    /// Cancelling the token ends the execution with
    /// [`ResponseStatus::Aborted`](super::ResponseStatus::Aborted).
    pub fn with_abort_token(mut self, token: CancellationToken) -> Self {
        self.abort = Some(token);
        self
    }
}

// Accessors
impl RestRequest {
    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path, relative to the client base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request timeout, overriding the client default when set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

fn header_key(name: impl Into<String>) -> String {
    let mut name = name.into();
    name.make_ascii_lowercase();
    name
}
