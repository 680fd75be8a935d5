//! Frame-number tracking and continuity detection
//!
//! Frame announcements arrive over a lossy, possibly reordering transport.
//! The tracker keeps a short sliding window of *received* numbers as evidence
//! and derives a continuity verdict from it, while the displayed frame only
//! ever moves forward (or jumps on an explicit reset).

use std::collections::VecDeque;
use std::fmt::Write as _;

/// Default number of announcements kept as continuity evidence
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
/// Smallest usable window (one adjacent pair)
pub const MIN_HISTORY_CAPACITY: usize = 2;
/// Largest window accepted from configuration
pub const MAX_HISTORY_CAPACITY: usize = 1000;

/// Bounded FIFO of received frame numbers in arrival order
#[derive(Debug, Clone)]
pub struct FrameHistory {
    entries: VecDeque<i64>,
    capacity: usize,
}

impl FrameHistory {
    /// Create an empty history holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(MIN_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a received number, evicting the oldest entries past capacity
    pub fn push(&mut self, frame: i64) {
        self.entries.push_back(frame);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries in arrival order
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().copied()
    }

    /// Change the capacity, dropping the oldest entries if it shrinks
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.clamp(MIN_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

/// Continuity verdict derived from a [`FrameHistory`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuityState {
    /// Whether any adjacent pair in the window differs by something other than +1
    pub in_discontinuity: bool,
    /// Comma-joined `a->b` entries, one per offending pair
    pub gap_report: String,
}

impl ContinuityState {
    /// Derive the verdict from the full history
    pub fn from_history(history: &FrameHistory) -> Self {
        let mut state = Self::default();
        let mut previous: Option<i64> = None;

        for frame in history.iter() {
            if let Some(prev) = previous {
                if prev.checked_add(1) != Some(frame) {
                    if state.in_discontinuity {
                        state.gap_report.push(',');
                    }
                    // Writing into a String cannot fail.
                    let _ = write!(state.gap_report, "{}->{}", prev, frame);
                    state.in_discontinuity = true;
                }
            }
            previous = Some(frame);
        }

        state
    }
}

/// Authoritative current frame plus continuity evidence
#[derive(Debug, Clone)]
pub struct FrameTracker {
    history: FrameHistory,
    current_frame: i64,
    continuity: ContinuityState,
    /// Flag value as of the last recompute; a reset does not touch it
    last_verdict: bool,
}

impl Default for FrameTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl FrameTracker {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: FrameHistory::new(history_capacity),
            current_frame: 0,
            continuity: ContinuityState::default(),
            last_verdict: false,
        }
    }

    /// Record an announced frame number.
    ///
    /// The value always lands in the history. The current frame only moves
    /// if `frame` is strictly greater; returns whether it advanced.
    pub fn record_frame(&mut self, frame: i64) -> bool {
        self.history.push(frame);
        if frame > self.current_frame {
            self.current_frame = frame;
            true
        } else {
            false
        }
    }

    /// Clear all evidence and jump to `frame` (0 if absent). Always advances.
    pub fn reset(&mut self, frame: Option<i64>) -> bool {
        self.history.clear();
        self.current_frame = frame.unwrap_or(0);
        self.continuity = ContinuityState::default();
        true
    }

    /// Re-derive the continuity verdict from the whole history.
    ///
    /// Returns whether the discontinuity flag flipped since the previous call.
    pub fn recompute_continuity(&mut self) -> bool {
        self.continuity = ContinuityState::from_history(&self.history);
        let verdict = self.continuity.in_discontinuity;
        let changed = verdict != self.last_verdict;
        self.last_verdict = verdict;
        changed
    }

    pub fn current_frame(&self) -> i64 {
        self.current_frame
    }

    pub fn in_discontinuity(&self) -> bool {
        self.continuity.in_discontinuity
    }

    pub fn gap_report(&self) -> &str {
        &self.continuity.gap_report
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.history.set_capacity(capacity);
    }

    /// Frame index to request from a source with `total_frames` frames.
    ///
    /// Out-of-range values wrap around; `None` when the source is empty.
    pub fn display_frame(&self, total_frames: u64) -> Option<u64> {
        if total_frames == 0 {
            return None;
        }
        let total = i128::from(total_frames);
        let wrapped = i128::from(self.current_frame).rem_euclid(total);
        u64::try_from(wrapped).ok()
    }
}
