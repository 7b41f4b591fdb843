//! Liveness tokens for deferred callbacks
//!
//! A callback scheduled for a later frame may outlive the component that
//! scheduled it. The component holds a [`LivenessToken`] and retires it on
//! teardown; the scheduler checks the token before running the callback.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared alive/retired flag
///
/// Clones share the same state. Retiring is one-way: a retired token never
/// becomes alive again, so a torn-down owner cannot be resurrected by a
/// stale clone.
///
/// # Example
///
/// ```
/// use pdf_annotator_scheduler::LivenessToken;
///
/// let token = LivenessToken::new();
/// let scheduled = token.clone();
///
/// token.retire();
/// assert!(!scheduled.is_alive());
/// ```
#[derive(Debug, Clone)]
pub struct LivenessToken {
    alive: Arc<AtomicBool>,
}

impl LivenessToken {
    /// Create a token in the alive state
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mark the owner as gone. Idempotent.
    pub fn retire(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Retires its token when dropped
///
/// Owners that can be dropped without an explicit close keep one of these so
/// their pending callbacks become no-ops either way.
#[derive(Debug)]
pub struct LivenessGuard {
    token: LivenessToken,
}

impl LivenessGuard {
    pub fn new() -> Self {
        Self {
            token: LivenessToken::new(),
        }
    }

    /// A clone of the guarded token, for handing to the scheduler
    pub fn token(&self) -> LivenessToken {
        self.token.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.token.is_alive()
    }

    pub fn retire(&self) {
        self.token.retire();
    }
}

impl Default for LivenessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LivenessGuard {
    fn drop(&mut self) {
        self.token.retire();
    }
}
