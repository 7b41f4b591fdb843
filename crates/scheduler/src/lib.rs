//! PDF Annotator Scheduler Library
//!
//! Frame coalescing for the annotation layer.
//!
//! All recomputation in the annotation layer is triggered from UI events and
//! deferred by at most one frame. This crate provides the two pieces that
//! make that safe:
//!
//! - [`FrameScheduler`] collapses repeated requests under one key into a
//!   single callback per frame.
//! - [`LivenessToken`] lets a component that is torn down between request
//!   and frame turn its pending callback into a no-op.

mod frame;
mod liveness;

pub use frame::{FrameKey, FrameScheduler, FrameStats, FRAME_BUDGET_60FPS};
pub use liveness::{LivenessGuard, LivenessToken};
