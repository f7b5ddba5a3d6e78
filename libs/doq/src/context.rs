//! Caller-side cancellation and deadlines
//!
//! A [`Context`] travels with every exchange. It is honored at each point
//! where a call may block: connection establishment, stream opening, the
//! write phase and the read phase.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Phase, Result};

/// Cancellation token plus optional deadline supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Build a context driven by an existing cancellation token
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Bound the context by an absolute deadline, keeping any earlier one
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        });
        self
    }

    /// Bound the context by a timeout measured from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that is cancelled along with this one
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Non-blocking check, `Some` once the context is done
    pub fn err(&self) -> Option<Error> {
        if self.token.is_cancelled() {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves with the reason once the context is cancelled or expired
    pub async fn done(&self) -> Error {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Error::Cancelled,
            _ = expire(self.deadline) => Error::DeadlineExceeded,
        }
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Run `op` until it completes or the context is done
///
/// The operation future is dropped as soon as the context fires.
pub(crate) async fn cancellable<F, T>(ctx: &Context, op: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        err = ctx.done() => Err(err),
        res = op => res,
    }
}

/// Run `op` bounded by the context and an optional fixed budget
///
/// Whichever of the context and the budget fires first decides the error.
/// A result that only becomes visible after the budget already elapsed is
/// reported as a timeout.
pub(crate) async fn bounded<F, T>(
    ctx: &Context,
    phase: Phase,
    budget: Option<Duration>,
    op: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(after) = budget else {
        return cancellable(ctx, op).await;
    };
    let deadline = Instant::now() + after;

    let res = tokio::select! {
        biased;
        err = ctx.done() => return Err(err),
        _ = sleep_until(deadline) => return Err(Error::Timeout { phase, after }),
        res = op => res,
    };

    if let Some(err) = ctx.err() {
        return Err(err);
    }
    if Instant::now() >= deadline {
        return Err(Error::Timeout { phase, after });
    }
    res
}
