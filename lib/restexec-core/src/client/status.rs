use super::error::ExecutionError;
use super::governor::GovernedOutcome;
use super::transport::TransportOutcome;

/// Client-side outcome of an execution.
///
/// This is orthogonal to the HTTP status code: a `404 Not Found` that was
/// transported and processed without fault is [`ResponseStatus::Completed`].
/// Always check this value before trusting the decoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ResponseStatus {
    /// The response was received and processed.
    Completed,
    /// The transport failed, or a hook or decoder rejected the response.
    Error,
    /// The deadline elapsed before the response was received.
    TimedOut,
    /// The caller cancelled the execution.
    Aborted,
}

impl ResponseStatus {
    /// Returns `true` for [`ResponseStatus::Completed`].
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

/// Maps a governed transport outcome, plus the fault of the deserialization
/// stage if any, to a [`ResponseStatus`].
///
/// Timeout and abort take precedence: the deserialization stage never runs for
/// them, so `fault` is irrelevant there. A deserialization fault turns an
/// otherwise received response into [`ResponseStatus::Error`].
pub fn classify(outcome: &GovernedOutcome, fault: Option<&ExecutionError>) -> ResponseStatus {
    match outcome {
        GovernedOutcome::TimedOut(_) => ResponseStatus::TimedOut,
        GovernedOutcome::Aborted => ResponseStatus::Aborted,
        GovernedOutcome::Finished(raw) => match raw.outcome() {
            TransportOutcome::Canceled => ResponseStatus::Aborted,
            TransportOutcome::Failed { .. } => ResponseStatus::Error,
            TransportOutcome::Received if fault.is_some() => ResponseStatus::Error,
            TransportOutcome::Received => ResponseStatus::Completed,
        },
    }
}

/// The fault carried by a governed outcome itself, before any deserialization.
pub(in crate::client) fn transport_fault(outcome: &GovernedOutcome) -> Option<ExecutionError> {
    match outcome {
        GovernedOutcome::TimedOut(timeout) => Some(ExecutionError::Timeout { timeout: *timeout }),
        GovernedOutcome::Aborted => Some(ExecutionError::Aborted),
        GovernedOutcome::Finished(raw) => match raw.outcome() {
            TransportOutcome::Received => None,
            TransportOutcome::Failed { message } => Some(ExecutionError::Transport {
                message: message.clone(),
            }),
            TransportOutcome::Canceled => Some(ExecutionError::Aborted),
        },
    }
}
