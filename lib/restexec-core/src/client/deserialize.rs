use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::decoder::Decoder;
use super::error::ExecutionError;
use super::transport::{RawResponse, TransportOutcome};

/// Error type returned by pre-deserialization hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

type HookFn = dyn FnOnce(&mut RawResponse) -> Result<(), HookError> + Send;

/// A caller-supplied function run on the [`RawResponse`] before decoding.
///
/// Hooks are registered per request, run in registration order, at most once,
/// and dropped at the end of the execution. The first failing hook (returned
/// error or panic) stops the stage and its message becomes the error message
/// of the response.
pub struct PreDeserializationHook {
    hook: Box<HookFn>,
}

impl PreDeserializationHook {
    /// Wraps a fallible function.
    pub fn new<F, E>(hook: F) -> Self
    where
        F: FnOnce(&mut RawResponse) -> Result<(), E> + Send + 'static,
        E: Into<HookError>,
    {
        Self {
            hook: Box::new(move |raw| hook(raw).map_err(Into::into)),
        }
    }

    fn call(self, raw: &mut RawResponse) -> Result<(), ExecutionError> {
        let Self { hook } = self;
        match panic::catch_unwind(AssertUnwindSafe(|| hook(raw))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(ExecutionError::Hook {
                message: error.to_string(),
            }),
            Err(payload) => Err(ExecutionError::Hook {
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

impl fmt::Debug for PreDeserializationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreDeserializationHook")
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "pre-deserialization hook panicked".to_string()
    }
}

/// Whether the stage should decode the body after the hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::client) enum Decoding {
    Typed { error_body: bool },
    Skip,
}

/// Hooks, then content decoding.
#[derive(Debug)]
pub(in crate::client) struct DeserializationStage<'a, D> {
    decoder: &'a D,
}

impl<'a, D> DeserializationStage<'a, D>
where
    D: Decoder,
{
    pub(in crate::client) fn new(decoder: &'a D) -> Self {
        Self { decoder }
    }

    /// Runs the stage on a response that reached it (neither timed out nor aborted).
    ///
    /// Only a [`TransportOutcome::Received`] response is decoded, hooks run in any case.
    pub(in crate::client) fn run<T>(
        &self,
        raw: &mut RawResponse,
        hooks: Vec<PreDeserializationHook>,
        decoding: Decoding,
    ) -> Result<Option<T>, ExecutionError>
    where
        T: DeserializeOwned,
    {
        Self::run_hooks(raw, hooks)?;

        let Decoding::Typed { error_body } = decoding else {
            return Ok(None);
        };
        if raw.outcome() != &TransportOutcome::Received {
            return Ok(None);
        }

        self.decode(raw, error_body)
    }

    fn run_hooks(
        raw: &mut RawResponse,
        hooks: Vec<PreDeserializationHook>,
    ) -> Result<(), ExecutionError> {
        let count = hooks.len();
        for (index, hook) in hooks.into_iter().enumerate() {
            if let Err(error) = hook.call(raw) {
                warn!(index, count, %error, "pre-deserialization hook failed");
                return Err(error);
            }
        }
        Ok(())
    }

    fn decode<T>(&self, raw: &RawResponse, error_body: bool) -> Result<Option<T>, ExecutionError>
    where
        T: DeserializeOwned,
    {
        let Some(status) = raw.status() else {
            return Ok(None);
        };
        if !status.is_success() && !error_body {
            debug!(%status, "skip decoding of non-success response");
            return Ok(None);
        }
        if raw.body().is_empty() {
            debug!(%status, "skip decoding of empty body");
            return Ok(None);
        }

        let content_type = raw.content_type();
        self.decoder
            .decode(content_type.as_ref(), raw.body())
            .map(Some)
            .map_err(|error| {
                warn!(%status, %error, "failed to decode response body");
                ExecutionError::Decode(error)
            })
    }
}
