use std::future::{Future, pending};
use std::time::Duration;

use tokio::time::{Instant, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::transport::RawResponse;

/// Default time granted to a transport to acknowledge a cancellation.
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_millis(100);

/// Result of racing a transport exchange against its deadline and the caller abort signal.
#[derive(Debug)]
pub enum GovernedOutcome {
    /// The transport answered before any interruption.
    Finished(RawResponse),
    /// The deadline fired first; the exchange was cancelled.
    TimedOut(Duration),
    /// The caller aborted the execution; the exchange was cancelled.
    Aborted,
}

/// Enforces the deadline of one execution.
///
/// Branches are polled in a fixed order: transport completion, then caller
/// abort, then deadline. When several are ready at the same poll point the
/// completion wins. Once an interruption is selected the transport result is
/// discarded, even if it shows up during the cancellation grace period.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGovernor {
    timeout: Option<Duration>,
    grace: Duration,
}

impl TimeoutGovernor {
    /// Creates a governor, a zero timeout meaning no deadline.
    pub fn new(timeout: Option<Duration>, grace: Duration) -> Self {
        let timeout = timeout.filter(|it| !it.is_zero());
        Self { timeout, grace }
    }

    /// The enforced timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs the exchange produced by `send` under this governor.
    ///
    /// `send` receives the cancellation token of the exchange and the deadline hint.
    pub async fn run<F, Fut>(&self, abort: Option<&CancellationToken>, send: F) -> GovernedOutcome
    where
        F: FnOnce(CancellationToken, Option<Instant>) -> Fut,
        Fut: Future<Output = RawResponse>,
    {
        let token = CancellationToken::new();
        let deadline = self.timeout.and_then(|it| match Instant::now().checked_add(it) {
            Some(at) => Some((at, it)),
            None => {
                debug!(timeout = ?it, "timeout out of range, no deadline enforced");
                None
            }
        });

        let in_flight = send(token.clone(), deadline.map(|(at, _)| at));
        tokio::pin!(in_flight);

        let expired = async {
            match deadline {
                Some((at, timeout)) => {
                    sleep_until(at).await;
                    timeout
                }
                None => pending().await,
            }
        };
        let aborted = async {
            match abort {
                Some(abort) => abort.cancelled().await,
                None => pending().await,
            }
        };

        let interrupted = tokio::select! {
            biased;
            response = &mut in_flight => return GovernedOutcome::Finished(response),
            () = aborted => {
                debug!("execution aborted by caller");
                GovernedOutcome::Aborted
            }
            timeout = expired => {
                debug!(?timeout, "deadline reached");
                GovernedOutcome::TimedOut(timeout)
            }
        };

        token.cancel();
        if timeout(self.grace, &mut in_flight).await.is_err() {
            warn!(grace = ?self.grace, "transport did not acknowledge cancellation in time");
        }

        interrupted
    }
}
