// src/cancel.rs
// =============================================================================
// One deadline + one cancellation token for the whole network pipeline.
//
// The metadata request and the archive download run one after the other
// and share a single time budget. Instead of a global abort flag, each
// stage receives a CancelContext and wraps its future with `run()`. The
// context knows how much time is left, so the second stage only gets
// what the first one did not use.
//
// Expiry and explicit cancellation are reported as different errors
// (Timeout vs Cancelled) so the caller can word the retry message.
//
// Rust concepts:
// - tokio::select!: race a future against cancellation and a deadline
// - CancellationToken: one signal shared by clones
// - Instant arithmetic: the deadline stays fixed across stages
// =============================================================================

use crate::error::{IngestError, IngestResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct CancelContext {
    token: CancellationToken,
    started: Instant,
    deadline: Instant,
}

impl CancelContext {
    /// Fresh context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_token(CancellationToken::new(), timeout)
    }

    /// Context driven by a caller-owned token (e.g. Ctrl+C handling).
    pub fn with_token(token: CancellationToken, timeout: Duration) -> Self {
        let started = Instant::now();
        Self {
            token,
            started,
            deadline: started + timeout,
        }
    }

    /// Nested context: same deadline, cancelled whenever the parent is,
    /// but cancelling the child leaves the parent alone.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            started: self.started,
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Time left before the deadline (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fails fast when the context is already spent, without starting work.
    pub fn check(&self, stage: &'static str) -> IngestResult<()> {
        if self.token.is_cancelled() {
            return Err(IngestError::Cancelled { stage });
        }
        if self.remaining().is_zero() {
            return Err(self.timeout_error(stage));
        }
        Ok(())
    }

    // Runs `fut` until it finishes, the token is cancelled, or the shared
    // deadline passes, whichever comes first. Dropping the future aborts
    // the in-flight request.
    pub async fn run<F, T>(&self, stage: &'static str, fut: F) -> IngestResult<T>
    where
        F: Future<Output = IngestResult<T>>,
    {
        self.check(stage)?;

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(IngestError::Cancelled { stage }),
            _ = tokio::time::sleep_until(self.deadline) => Err(self.timeout_error(stage)),
            result = fut => result,
        }
    }

    fn timeout_error(&self, stage: &'static str) -> IngestError {
        IngestError::Timeout {
            stage,
            elapsed_ms: self.elapsed().as_millis() as u64,
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does tokio::select! do?
//    - It polls several futures at once and runs the branch of whichever
//      finishes first; the other futures are dropped (and so stop)
//    - Here: the real work, the cancellation token, and the deadline
//
// 2. Why an Instant deadline instead of a Duration per stage?
//    - The timeout covers the whole ingestion, not each request
//    - The metadata call uses part of it; the download gets what is left
//
// 3. What is a CancellationToken?
//    - A cheap, clonable flag from tokio-util
//    - token.cancel() wakes every task waiting on token.cancelled()
//
// 4. Why do the tests pause the clock?
//    - #[tokio::test(start_paused = true)] makes time jump instantly
//    - A 30 second deadline can be tested without waiting 30 seconds
// -----------------------------------------------------------------------------
