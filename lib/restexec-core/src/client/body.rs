use bytes::Bytes;
use headers::ContentType;
use serde::Serialize;

use super::RestClientError;

/// Body of an HTTP request with its content type.
#[derive(Clone, derive_more::Debug)]
pub struct RequestBody {
    pub(super) content_type: ContentType,
    #[debug(ignore)]
    pub(super) data: Bytes,
}

impl RequestBody {
    /// Creates a JSON body from a serializable type.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be serialized as JSON.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use restexec_core::RequestBody;
    /// # use serde::Serialize;
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// #[derive(Serialize)]
    /// struct User {
    ///     name: String,
    /// }
    ///
    /// let body = RequestBody::json(&User { name: "Alice".to_string() })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn json<T>(t: &T) -> Result<Self, RestClientError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_vec(t)?;

        Ok(Self {
            content_type: ContentType::json(),
            data: data.into(),
        })
    }

    /// Creates an `application/x-www-form-urlencoded` body from a serializable type.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be represented as a flat form.
    pub fn form<T>(t: &T) -> Result<Self, RestClientError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_urlencoded::to_string(t)
            .map_err(|e| RestClientError::SerializationError {
                message: format!("Failed to serialize form data: {e}"),
            })?
            .into_bytes();

        Ok(Self {
            content_type: ContentType::form_url_encoded(),
            data: data.into(),
        })
    }

    /// Creates a raw body with a custom content type.
    pub fn raw(data: impl Into<Bytes>, content_type: ContentType) -> Self {
        Self {
            content_type,
            data: data.into(),
        }
    }

    /// Creates a `text/plain` body.
    pub fn text(text: impl Into<String>) -> Self {
        Self::raw(text.into(), ContentType::text())
    }

    /// The content type sent with this body.
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// The encoded payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}
