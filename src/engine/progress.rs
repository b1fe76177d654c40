//! Lock-free search progress shared between the search worker and observers

use crate::SearchState;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Progress of the current (or most recently finished) search
///
/// There is exactly one writer, the search loop. Evaluation counts are only
/// ever stored with increasing values, so concurrent reads never go
/// backwards.
#[derive(Debug)]
pub(crate) struct SearchProgress {
    evaluations: AtomicU64,
    counter: AtomicU32,
    found: AtomicBool,
    state: AtomicU8,
    target: AtomicU32,
}

impl SearchProgress {
    pub(crate) fn new() -> Self {
        Self {
            evaluations: AtomicU64::new(0),
            counter: AtomicU32::new(0),
            found: AtomicBool::new(false),
            state: AtomicU8::new(SearchState::Idle as u8),
            target: AtomicU32::new(0),
        }
    }

    pub(crate) fn begin(&self, target: u32, start: u32) {
        self.found.store(false, Ordering::Relaxed);
        self.evaluations.store(0, Ordering::Relaxed);
        self.counter.store(start, Ordering::Relaxed);
        self.target.store(target, Ordering::Relaxed);
        self.state
            .store(SearchState::Searching as u8, Ordering::Release);
    }

    #[inline]
    pub(crate) fn publish(&self, evaluations: u64, counter: u32) {
        self.evaluations.store(evaluations, Ordering::Relaxed);
        self.counter.store(counter, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self, evaluations: u64, counter: u32, state: SearchState) {
        self.publish(evaluations, counter);
        self.found
            .store(state == SearchState::Found, Ordering::Release);
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Read-only view of a search's progress
///
/// Cheap to clone and safe to poll from any thread while the search runs.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    inner: Arc<SearchProgress>,
}

impl ProgressHandle {
    pub(crate) fn new(inner: Arc<SearchProgress>) -> Self {
        Self { inner }
    }

    /// Digests computed so far in the current or last search
    pub fn evaluations_completed(&self) -> u64 {
        self.inner.evaluations.load(Ordering::Relaxed)
    }

    /// Whether the current or last search found a collision
    pub fn found_collision(&self) -> bool {
        self.inner.found.load(Ordering::Acquire)
    }

    /// Counter most recently published by the search loop
    pub fn current_counter(&self) -> u32 {
        self.inner.counter.load(Ordering::Relaxed)
    }

    /// Target of the current or last search, zero before the first search
    pub fn target_bits(&self) -> u32 {
        self.inner.target.load(Ordering::Relaxed)
    }

    /// Lifecycle state of the current or last search
    pub fn state(&self) -> SearchState {
        SearchState::from_u8(self.inner.state.load(Ordering::Acquire))
    }
}
