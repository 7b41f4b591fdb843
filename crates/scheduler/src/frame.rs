//! Animation-frame coalescing
//!
//! Event handlers (scroll, resize) may fire many times between two frames.
//! Each handler requests a frame under its own key; requests with the same
//! key collapse so the work runs at most once per frame, with the most
//! recently requested callback.

use crate::liveness::LivenessToken;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Frame budget for 60 FPS displays (16.67ms)
pub const FRAME_BUDGET_60FPS: Duration = Duration::from_micros(16_667);

/// Identifies one coalescing slot, usually one per component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameKey(u64);

impl FrameKey {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Outcome of a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Callbacks executed
    pub executed: usize,
    /// Callbacks skipped because their owner was retired
    pub skipped: usize,
}

struct PendingFrame {
    liveness: LivenessToken,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct FrameQueue {
    next_key: u64,
    /// Keys in first-request order
    order: Vec<FrameKey>,
    pending: HashMap<FrameKey, PendingFrame>,
    frames_run: u64,
}

/// Single-threaded frame scheduler
///
/// The host drives it by calling [`FrameScheduler::run_frame`] once per
/// display frame. Shared by reference (usually `Rc`) between every component
/// of one viewer.
///
/// # Example
///
/// ```
/// use pdf_annotator_scheduler::{FrameScheduler, LivenessToken};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let scheduler = FrameScheduler::new();
/// let key = scheduler.allocate_key();
/// let token = LivenessToken::new();
/// let runs = Rc::new(Cell::new(0));
///
/// for _ in 0..5 {
///     let runs = Rc::clone(&runs);
///     scheduler.request(key, &token, move || runs.set(runs.get() + 1));
/// }
///
/// scheduler.run_frame();
/// assert_eq!(runs.get(), 1);
/// ```
#[derive(Default)]
pub struct FrameScheduler {
    queue: RefCell<FrameQueue>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a key no other caller of this scheduler holds
    pub fn allocate_key(&self) -> FrameKey {
        let mut queue = self.queue.borrow_mut();
        let key = FrameKey(queue.next_key);
        queue.next_key += 1;
        key
    }

    /// Request `callback` on the next frame
    ///
    /// Returns `true` when this opened a new slot and `false` when it replaced
    /// the callback of an already pending request under `key`.
    pub fn request<F>(&self, key: FrameKey, liveness: &LivenessToken, callback: F) -> bool
    where
        F: FnOnce() + 'static,
    {
        let mut queue = self.queue.borrow_mut();
        let frame = PendingFrame {
            liveness: liveness.clone(),
            callback: Box::new(callback),
        };

        let is_new = queue.pending.insert(key, frame).is_none();
        if is_new {
            queue.order.push(key);
        } else {
            log::trace!("frame request {} coalesced", key.0);
        }
        is_new
    }

    /// Drop a pending request. Returns whether one was pending.
    pub fn cancel(&self, key: FrameKey) -> bool {
        let mut queue = self.queue.borrow_mut();
        let removed = queue.pending.remove(&key).is_some();
        if removed {
            queue.order.retain(|pending| *pending != key);
        }
        removed
    }

    pub fn is_pending(&self, key: FrameKey) -> bool {
        self.queue.borrow().pending.contains_key(&key)
    }

    pub fn pending_count(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    /// Number of frames run so far
    pub fn frames_run(&self) -> u64 {
        self.queue.borrow().frames_run
    }

    /// Run every pending callback whose owner is still alive
    ///
    /// Callbacks may request new frames; those run on the following frame.
    pub fn run_frame(&self) -> FrameStats {
        let batch = {
            let mut queue = self.queue.borrow_mut();
            queue.frames_run += 1;
            let order = std::mem::take(&mut queue.order);
            let mut pending = std::mem::take(&mut queue.pending);
            order
                .into_iter()
                .filter_map(|key| pending.remove(&key).map(|frame| (key, frame)))
                .collect::<Vec<_>>()
        };

        let start = Instant::now();
        let mut stats = FrameStats::default();
        for (key, frame) in batch {
            if frame.liveness.is_alive() {
                (frame.callback)();
                stats.executed += 1;
            } else {
                log::trace!("frame request {} skipped, owner retired", key.0);
                stats.skipped += 1;
            }
        }

        let elapsed = start.elapsed();
        if elapsed > FRAME_BUDGET_60FPS {
            log::debug!(
                "frame ran {} callbacks in {:?}, over the {:?} budget",
                stats.executed,
                elapsed,
                FRAME_BUDGET_60FPS
            );
        }
        stats
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("FrameScheduler")
            .field("pending", &queue.order)
            .field("frames_run", &queue.frames_run)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() -> Box<dyn FnOnce()>) {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        let make = move || {
            let handle = Rc::clone(&handle);
            Box::new(move || handle.set(handle.get() + 1)) as Box<dyn FnOnce()>
        };
        (count, make)
    }

    #[test]
    fn test_requests_with_same_key_coalesce() {
        let scheduler = FrameScheduler::new();
        let key = scheduler.allocate_key();
        let token = LivenessToken::new();
        let (count, make) = counter();

        assert!(scheduler.request(key, &token, make()));
        assert!(!scheduler.request(key, &token, make()));
        assert!(!scheduler.request(key, &token, make()));
        assert_eq!(scheduler.pending_count(), 1);

        let stats = scheduler.run_frame();
        assert_eq!(
            stats,
            FrameStats {
                executed: 1,
                skipped: 0
            }
        );
        assert_eq!(count.get(), 1);
        assert!(!scheduler.is_pending(key));
    }

    #[test]
    fn test_latest_callback_wins() {
        let scheduler = FrameScheduler::new();
        let key = scheduler.allocate_key();
        let token = LivenessToken::new();
        let seen = Rc::new(Cell::new(0));

        for value in 1..=3 {
            let seen = Rc::clone(&seen);
            scheduler.request(key, &token, move || seen.set(value));
        }
        scheduler.run_frame();
        assert_eq!(seen.get(), 3);
    }

    #[test]
    fn test_distinct_keys_run_in_request_order() {
        let scheduler = FrameScheduler::new();
        let first = scheduler.allocate_key();
        let second = scheduler.allocate_key();
        assert_ne!(first, second);

        let token = LivenessToken::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (key, label) in [(second, "second"), (first, "first")] {
            let log = Rc::clone(&log);
            scheduler.request(key, &token, move || log.borrow_mut().push(label));
        }

        scheduler.run_frame();
        assert_eq!(*log.borrow(), vec!["second", "first"]);
    }

    #[test]
    fn test_retired_owner_is_skipped() {
        let scheduler = FrameScheduler::new();
        let key = scheduler.allocate_key();
        let token = LivenessToken::new();
        let (count, make) = counter();

        scheduler.request(key, &token, make());
        token.retire();

        let stats = scheduler.run_frame();
        assert_eq!(
            stats,
            FrameStats {
                executed: 0,
                skipped: 1
            }
        );
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_cancel_removes_request() {
        let scheduler = FrameScheduler::new();
        let key = scheduler.allocate_key();
        let token = LivenessToken::new();
        let (count, make) = counter();

        scheduler.request(key, &token, make());
        assert!(scheduler.cancel(key));
        assert!(!scheduler.cancel(key));

        scheduler.run_frame();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_request_from_callback_runs_next_frame() {
        let scheduler = Rc::new(FrameScheduler::new());
        let key = scheduler.allocate_key();
        let token = LivenessToken::new();
        let (count, make) = counter();

        let inner_scheduler = Rc::clone(&scheduler);
        let inner_token = token.clone();
        let inner = make();
        scheduler.request(key, &token, move || {
            inner_scheduler.request(key, &inner_token, inner);
        });

        scheduler.run_frame();
        assert_eq!(count.get(), 0);
        assert!(scheduler.is_pending(key));

        scheduler.run_frame();
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.frames_run(), 2);
    }

    #[test]
    fn test_empty_frame() {
        let scheduler = FrameScheduler::default();
        assert_eq!(scheduler.run_frame(), FrameStats::default());
    }
}
