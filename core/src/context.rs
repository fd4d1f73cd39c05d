//! Cancellation and deadline context carried by every request.
//!
//! # Design
//! A `Context` is cheap to clone and every clone observes the same
//! cancellation flag, so the copy stored inside an `OutgoingRequest` sees a
//! `cancel()` issued through the caller's `CancelHandle`. The client never
//! owns a timer: a context is done only when the caller cancels it or its
//! deadline passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ContextError;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    /// Own flag last, preceded by every ancestor's.
    cancelled: Vec<Arc<AtomicBool>>,
}

/// Cancels the context it was created with, and every clone of it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Context {
    /// A context that is never done.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Vec::new(),
        }
    }

    /// A timeout too large to represent as an `Instant` means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn with_cancel() -> (Self, CancelHandle) {
        Self::background().cancellable()
    }

    /// Derive a cancellable child. The child keeps this context's deadline
    /// and is cancelled whenever this context is; cancelling the child
    /// leaves this context live.
    pub fn cancellable(&self) -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let mut cancelled = self.cancelled.clone();
        cancelled.push(Arc::clone(&flag));
        let ctx = Self {
            deadline: self.deadline,
            cancelled,
        };
        (ctx, CancelHandle { flag })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancelled.iter().any(|flag| flag.load(Ordering::SeqCst)) {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_never_done() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.remaining().is_none());
    }

    #[test]
    fn zero_timeout_is_immediately_exceeded() {
        let ctx = Context::with_timeout(Duration::ZERO);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn cancel_is_seen_by_clones() {
        let (ctx, handle) = Context::with_cancel();
        let copy = ctx.clone();
        assert!(!copy.is_done());
        handle.cancel();
        assert_eq!(copy.err(), Some(ContextError::Canceled));
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn cancellation_wins_over_deadline() {
        let (ctx, handle) = Context::with_timeout(Duration::ZERO).cancellable();
        handle.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn parent_cancel_reaches_child() {
        let (parent, parent_handle) = Context::with_cancel();
        let (child, child_handle) = parent.cancellable();
        let (grandchild, _) = child.cancellable();

        child_handle.cancel();
        assert_eq!(grandchild.err(), Some(ContextError::Canceled));
        assert!(parent.err().is_none());

        let (sibling, _) = parent.cancellable();
        parent_handle.cancel();
        assert_eq!(sibling.err(), Some(ContextError::Canceled));
        assert_eq!(parent.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn unrepresentable_timeout_has_no_deadline() {
        let ctx = Context::with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(ctx.err().is_none());
    }

    #[test]
    fn future_deadline_is_live() {
        let ctx = Context::with_timeout(Duration::from_secs(60));
        assert!(ctx.err().is_none());
        assert!(ctx.remaining().unwrap() > Duration::from_secs(30));
    }
}
