//! Collision search engine
//!
//! Exhaustively walks the 32-bit counter space in increasing order, framing,
//! hashing and testing one message per counter. The first (smallest) counter
//! whose digest meets the target wins.
//!
//! The search loop is synchronous and never waits on anything. Progress is
//! published through a [`ProgressHandle`] that other threads may poll while
//! the search runs.

pub(crate) mod progress;

pub use progress::ProgressHandle;

use crate::crypto::{meets_target, BlockHasher, Sha1BlockHasher};
use crate::framer::MessageFramer;
use crate::{BaseString, Error, Result, SearchState, Target};
use progress::SearchProgress;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn};

/// Evaluations between progress publications and cancellation checks
pub const PUBLISH_INTERVAL: u64 = 1 << 12;

/// Partial collision search over a configurable base string and target
///
/// Configuration setters take `&mut self`, so they can only run while no
/// search is borrowing the engine.
#[derive(Debug)]
pub struct Engine<H = Sha1BlockHasher> {
    hasher: H,
    base: BaseString,
    target: Target,
    progress: Arc<SearchProgress>,
}

impl Engine<Sha1BlockHasher> {
    /// Engine backed by SHA-1
    pub fn sha1() -> Self {
        Self::new(Sha1BlockHasher::new())
    }
}

impl Default for Engine<Sha1BlockHasher> {
    fn default() -> Self {
        Self::sha1()
    }
}

impl<H: BlockHasher> Engine<H> {
    /// Create an idle engine with an empty base string and the easiest target
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            base: BaseString::default(),
            target: Target::MIN,
            progress: Arc::new(SearchProgress::new()),
        }
    }

    /// Set the base string the counter is substituted into
    ///
    /// Oversized base strings are accepted and truncated during framing.
    pub fn set_base_string(&mut self, base: impl Into<BaseString>) {
        let base = base.into();
        if base.is_truncated() {
            warn!(
                "Base string is {} bytes, only the first {} are used",
                base.len(),
                crate::framer::PAYLOAD_LEN
            );
        }
        self.base = base;
    }

    /// Set the required number of leading zero bits; zero is treated as one
    pub fn set_target(&mut self, bits: u32) {
        self.target = Target::new(bits);
    }

    /// Current base string
    pub fn base_string(&self) -> &BaseString {
        &self.base
    }

    /// Current target
    pub fn target(&self) -> Target {
        self.target
    }

    /// Hash function in use
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Search for the smallest counter meeting the target
    ///
    /// Returns [`Error::Exhausted`] when no 32-bit counter matches, which is
    /// distinct from a collision at counter zero.
    pub fn search(&mut self) -> Result<u32> {
        self.run(0, None)
    }

    /// Like [`Engine::search`], but gives up once `cancel` fires
    ///
    /// The token is polled without blocking every [`PUBLISH_INTERVAL`]
    /// evaluations; a cancelled search returns [`Error::Abandoned`].
    pub fn search_until(&mut self, cancel: &CancellationToken) -> Result<u32> {
        self.run(0, Some(cancel))
    }

    /// Handle for observing progress from another thread or task
    pub fn progress(&self) -> ProgressHandle {
        ProgressHandle::new(Arc::clone(&self.progress))
    }

    /// Digests computed by the current or most recent search
    pub fn evaluations_completed(&self) -> u64 {
        self.progress().evaluations_completed()
    }

    /// Whether the current or most recent search found a collision
    pub fn found_collision(&self) -> bool {
        self.progress().found_collision()
    }

    /// Lifecycle state of the current or most recent search
    pub fn state(&self) -> SearchState {
        self.progress().state()
    }

    /// Digest of the message framed for `counter` under the current base string
    pub fn digest_for(&self, counter: u32) -> H::Output {
        let block = MessageFramer::new(self.base.as_bytes()).frame(counter);
        self.hasher.hash_block(&block)
    }

    /// Check `counter` against the current base string and target
    pub fn verify(&self, counter: u32) -> bool {
        meets_target(self.digest_for(counter).as_ref(), self.target)
    }

    fn run(&mut self, start: u32, cancel: Option<&CancellationToken>) -> Result<u32> {
        let target = self.target;
        let framer = MessageFramer::new(self.base.as_bytes());
        let _span = info_span!("search", target = target.bits(), hasher = self.hasher.name())
            .entered();

        self.progress.begin(target.bits(), start);
        debug!("Search started at counter {:#010x}", start);

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            self.progress.finish(0, start, SearchState::Abandoned);
            warn!("Search cancelled before the first evaluation");
            return Err(Error::abandoned(target.bits(), 0));
        }

        let mut block = framer.frame(start);
        let mut counter = start;
        let mut evaluations = 0u64;

        loop {
            framer.reframe(&mut block, counter);
            let digest = self.hasher.hash_block(&block);
            evaluations += 1;

            if meets_target(digest.as_ref(), target) {
                self.progress
                    .finish(evaluations, counter, SearchState::Found);
                debug!(
                    "Collision found at counter {:#010x} after {} evaluations",
                    counter, evaluations
                );
                return Ok(counter);
            }

            if evaluations & (PUBLISH_INTERVAL - 1) == 0 {
                self.progress.publish(evaluations, counter);

                if cancel.is_some_and(CancellationToken::is_cancelled) {
                    self.progress
                        .finish(evaluations, counter, SearchState::Abandoned);
                    warn!("Search abandoned after {} evaluations", evaluations);
                    return Err(Error::abandoned(target.bits(), evaluations));
                }
            }

            if counter == u32::MAX {
                break;
            }
            counter += 1;
        }

        self.progress
            .finish(evaluations, counter, SearchState::Exhausted);
        warn!(
            "Counter space exhausted after {} evaluations without a collision",
            evaluations
        );
        Err(Error::exhausted(target.bits()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framer::{counter_of, MessageBlock};
    use assert_matches::assert_matches;
    use std::thread;
    use std::time::Duration;

    /// Never produces a matching digest
    #[derive(Debug, Clone, Copy)]
    struct NeverHasher;

    impl BlockHasher for NeverHasher {
        type Output = [u8; 4];

        fn hash_block(&self, _block: &MessageBlock) -> [u8; 4] {
            [0xFF; 4]
        }

        fn name(&self) -> &'static str {
            "never"
        }
    }

    /// Produces an all-zero digest for exactly one counter
    #[derive(Debug, Clone, Copy)]
    struct ZeroAtHasher(u32);

    impl BlockHasher for ZeroAtHasher {
        type Output = [u8; 4];

        fn hash_block(&self, block: &MessageBlock) -> [u8; 4] {
            if counter_of(block) == self.0 {
                [0; 4]
            } else {
                [0xFF; 4]
            }
        }

        fn name(&self) -> &'static str {
            "zero-at"
        }
    }

    #[test]
    fn test_new_engine_is_idle() {
        let engine = Engine::sha1();
        assert_eq!(engine.state(), SearchState::Idle);
        assert_eq!(engine.target(), Target::MIN);
        assert_eq!(engine.evaluations_completed(), 0);
        assert!(!engine.found_collision());
    }

    #[test]
    fn test_target_zero_behaves_as_one() {
        let mut engine = Engine::sha1();
        engine.set_base_string("XXXX test");

        engine.set_target(0);
        assert_eq!(engine.target(), Target::new(1));
        let with_zero = engine.search().unwrap();

        engine.set_target(1);
        let with_one = engine.search().unwrap();

        assert_eq!(with_zero, with_one);
    }

    #[test]
    fn test_search_returns_smallest_counter() {
        let mut engine = Engine::sha1();
        engine.set_base_string("XXXX test");
        engine.set_target(8);

        let counter = engine.search().unwrap();

        assert!(engine.verify(counter));
        for smaller in 0..counter {
            assert!(!engine.verify(smaller), "counter {} also matches", smaller);
        }
        assert!(engine.found_collision());
        assert_eq!(engine.state(), SearchState::Found);
        assert_eq!(engine.evaluations_completed(), u64::from(counter) + 1);
    }

    #[test]
    fn test_search_is_deterministic() {
        let mut engine = Engine::sha1();
        engine.set_base_string("XXXX test");
        engine.set_target(6);

        let first = engine.search().unwrap();
        let second = engine.search().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_collision_at_counter_zero_is_not_exhaustion() {
        let mut engine = Engine::new(ZeroAtHasher(0));
        engine.set_target(32);

        assert_eq!(engine.search().unwrap(), 0);
        assert!(engine.found_collision());
        assert_eq!(engine.evaluations_completed(), 1);
    }

    #[test]
    fn test_exhausted_counter_space() {
        let mut engine = Engine::new(NeverHasher);
        engine.set_target(3);

        let result = engine.run(u32::MAX - 9, None);

        assert_matches!(result, Err(Error::Exhausted { target: 3 }));
        assert_eq!(engine.evaluations_completed(), 10);
        assert_eq!(engine.state(), SearchState::Exhausted);
        assert!(!engine.found_collision());
        assert_eq!(engine.progress().current_counter(), u32::MAX);
    }

    #[test]
    fn test_match_on_last_counter() {
        let mut engine = Engine::new(ZeroAtHasher(u32::MAX));
        assert_eq!(engine.run(u32::MAX - 2, None).unwrap(), u32::MAX);
        assert_eq!(engine.evaluations_completed(), 3);
    }

    #[test]
    fn test_pre_cancelled_search_is_abandoned() {
        let mut engine = Engine::new(NeverHasher);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine.search_until(&cancel);

        assert_matches!(result, Err(Error::Abandoned { evaluations: 0, .. }));
        assert_eq!(engine.state(), SearchState::Abandoned);
    }

    #[test]
    fn test_cancel_running_search() {
        let mut engine = Engine::new(NeverHasher);
        let progress = engine.progress();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let worker = thread::spawn(move || engine.search_until(&worker_cancel));

        while progress.evaluations_completed() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        cancel.cancel();

        let result = worker.join().unwrap();
        assert_matches!(result, Err(Error::Abandoned { evaluations, .. }) if evaluations >= PUBLISH_INTERVAL);
        assert_eq!(progress.state(), SearchState::Abandoned);
    }

    #[test]
    fn test_progress_is_monotonic_during_search() {
        const COLLISION_AT: u32 = 300_000;
        let mut engine = Engine::new(ZeroAtHasher(COLLISION_AT));
        let progress = engine.progress();

        let worker = thread::spawn(move || {
            let result = engine.search();
            (engine, result)
        });

        let mut last = 0;
        while !progress.state().is_terminal() {
            let now = progress.evaluations_completed();
            assert!(now >= last, "evaluations went from {} to {}", last, now);
            last = now;
            thread::yield_now();
        }

        let (engine, result) = worker.join().unwrap();
        assert_eq!(result.unwrap(), COLLISION_AT);
        assert!(progress.evaluations_completed() >= last);
        assert_eq!(engine.evaluations_completed(), u64::from(COLLISION_AT) + 1);
        assert!(progress.found_collision());
    }

    #[test]
    fn test_next_search_resets_found_flag() {
        let mut engine = Engine::new(ZeroAtHasher(5));
        engine.search().unwrap();
        assert!(engine.found_collision());

        let progress = engine.progress();
        let result = engine.run(u32::MAX, None);
        assert_matches!(result, Err(Error::Exhausted { .. }));
        assert!(!progress.found_collision());
        assert_eq!(progress.evaluations_completed(), 1);
    }

    #[test]
    fn test_oversized_base_string_is_accepted() {
        let mut engine = Engine::sha1();
        engine.set_base_string("XXXX Keep your head cool and your FPGA spinning! twice over");
        engine.set_target(4);

        let counter = engine.search().unwrap();
        let mut truncated = Engine::sha1();
        truncated.set_base_string("XXXX Keep your head cool and your FPGA spinning!");
        truncated.set_target(4);

        assert_eq!(truncated.search().unwrap(), counter);
    }
}
