use super::error::ScpError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Clonable switch that aborts a transfer from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cancellation and deadline observed before every blocking operation of a
/// transfer. Once it fires the stream is left mid-exchange and must be dropped.
///
/// An explicit [`CancelHandle::cancel`] only takes effect between blocking
/// calls: a read already waiting on the transport returns on its own or when
/// the transport's own timeout expires.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancelHandle,
    deadline: Option<Instant>,
}

impl Context {
    /// Never cancelled, no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancel(self, cancel: CancelHandle) -> Self {
        Context { cancel, ..self }
    }

    pub fn with_deadline(self, deadline: Instant) -> Self {
        Context {
            deadline: Some(deadline),
            ..self
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn check(&self) -> Result<(), ScpError> {
        if self.cancel.is_cancelled() {
            return Err(ScpError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ScpError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
