//! Frame synchronization
//!
//! Tracks announced frame numbers and flags discontinuities in the stream.

mod tracker;

pub use tracker::{
    ContinuityState, FrameHistory, FrameTracker, DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY,
    MIN_HISTORY_CAPACITY,
};
