use std::fmt::Debug;

use mime::Mime;
use serde::de::value::StrDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};

/// Codec collaborator turning a response body into a typed value.
///
/// The implementation picks the format from the declared content type.
pub trait Decoder: Debug + Send + Sync + 'static {
    /// Decodes `body` into `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on malformed payload or type mismatch.
    fn decode<T>(&self, content_type: Option<&Mime>, body: &[u8]) -> Result<T, DecodeError>
    where
        T: DeserializeOwned;
}

/// Failure of a [`Decoder`].
#[derive(Debug, derive_more::Error, derive_more::Display)]
pub enum DecodeError {
    /// JSON response deserialization failure.
    #[display("Failed to deserialize JSON at '{path}': {error}")]
    Json {
        /// Path of the offending value inside the document.
        path: String,
        /// The underlying JSON parsing error.
        error: serde_json::Error,
    },

    /// Form-urlencoded response deserialization failure.
    #[display("Failed to deserialize form: {_0}")]
    Form(serde_urlencoded::de::Error),

    /// Text body is not UTF-8.
    #[display("Response body is not valid UTF-8: {_0}")]
    Utf8(std::str::Utf8Error),

    /// Text body cannot be read as the target type.
    #[display("Failed to deserialize text: {_0}")]
    Text(serde::de::value::Error),

    /// XML response deserialization failure.
    #[cfg(feature = "xml")]
    #[display("Failed to deserialize XML: {_0}")]
    Xml(serde_xml_rs::Error),

    /// Failure reported by a custom decoder.
    #[display("{message}")]
    Other {
        /// Description of the failure.
        message: String,
    },
}

impl DecodeError {
    /// Builds a failure for custom [`Decoder`] implementations.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Default [`Decoder`] dispatching on the response content type.
///
/// | Content type                                  | Format                           |
/// |-----------------------------------------------|----------------------------------|
/// | `application/json`, `*/*+json`                | JSON                             |
/// | `application/x-www-form-urlencoded`           | form                             |
/// | `application/xml`, `text/xml`, `*/*+xml`      | XML (with the `xml` feature)     |
/// | `text/*`                                      | the body as a string             |
/// | missing or anything else                      | JSON                             |
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentDecoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Form,
    #[cfg(feature = "xml")]
    Xml,
    Text,
}

impl Format {
    fn of(content_type: Option<&Mime>) -> Self {
        let Some(mime) = content_type else {
            return Self::Json;
        };

        if mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON) {
            return Self::Json;
        }
        if mime.type_() == mime::APPLICATION && mime.subtype() == mime::WWW_FORM_URLENCODED {
            return Self::Form;
        }
        #[cfg(feature = "xml")]
        if mime.subtype() == mime::XML || mime.suffix() == Some(mime::XML) {
            return Self::Xml;
        }
        if mime.type_() == mime::TEXT {
            return Self::Text;
        }

        Self::Json
    }
}

impl Decoder for ContentDecoder {
    fn decode<T>(&self, content_type: Option<&Mime>, body: &[u8]) -> Result<T, DecodeError>
    where
        T: DeserializeOwned,
    {
        match Format::of(content_type) {
            Format::Json => {
                let deserializer = &mut serde_json::Deserializer::from_slice(body);
                serde_path_to_error::deserialize(deserializer).map_err(|err| DecodeError::Json {
                    path: err.path().to_string(),
                    error: err.into_inner(),
                })
            }
            Format::Form => serde_urlencoded::from_bytes(body).map_err(DecodeError::Form),
            #[cfg(feature = "xml")]
            Format::Xml => serde_xml_rs::from_reader(body).map_err(DecodeError::Xml),
            Format::Text => {
                let text = std::str::from_utf8(body).map_err(DecodeError::Utf8)?;
                let deserializer: StrDeserializer<'_, serde::de::value::Error> =
                    text.into_deserializer();
                T::deserialize(deserializer).map_err(DecodeError::Text)
            }
        }
    }
}
