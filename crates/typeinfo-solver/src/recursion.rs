//! Recursion guards for cycle detection and depth limiting in type
//! resolution passes.
//!
//! Every resolution pass owns one `RecursionGuard`, which refuses to enter a
//! key that is already being expanded and bounds both nesting depth and total
//! work. A denied entry is never an error here: callers degrade to the
//! erasure of whatever they were expanding.
//!
//! Limits come from a named [`RecursionProfile`] so call sites state intent:
//!
//! ```ignore
//! let guard = RecursionGuard::with_profile(RecursionProfile::TypeResolution);
//! ```
//!
//! In debug builds, dropping a guard with active entries or leaving a key
//! that was never entered panics.

use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Type variable bound expansion during resolution, keyed by type
    /// variable identity.
    ///
    /// depth = 50, iterations = 100,000
    TypeResolution,

    /// Walking declared supertypes to view a type as one of its ancestors,
    /// keyed by raw type identity.
    ///
    /// depth = 100, iterations = 100,000
    SupertypeView,

    /// Structural descent through argument lists (specialization and
    /// assignability).
    ///
    /// depth = 100
    ArgumentDescent,
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::TypeResolution => 50,
            Self::SupertypeView | Self::ArgumentDescent => 100,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        100_000
    }
}

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// The key is already being expanded.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

/// Visiting set plus depth and iteration bounds.
///
/// ```ignore
/// match guard.enter(key) {
///     RecursionResult::Entered => {
///         let result = expand();
///         guard.leave(key);
///         result
///     }
///     denied => erase(denied),
/// }
/// ```
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a recursive computation for `key`.
    ///
    /// On [`RecursionResult::Entered`] the caller must call
    /// [`leave`](Self::leave) with the same key when done.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            return RecursionResult::DepthExceeded;
        }
        if !self.visiting.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.visiting.is_empty() {
            panic!(
                "RecursionGuard dropped with {} active entries still in the visiting set",
                self.visiting.len(),
            );
        }
    }
}

/// Depth-only guard for structural descent.
///
/// Argument trees may repeat the same type at several positions, so no
/// visiting set is kept.
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
}

impl DepthCounter {
    fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    /// Only the profile's `max_depth` is used.
    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Returns `false` once the limit is reached; the depth is then not
    /// incremented and `leave()` must not be called.
    #[inline]
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            return false;
        }
        self.depth += 1;
        true
    }

    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() called at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(debug_assertions)]
impl Drop for DepthCounter {
    fn drop(&mut self) {
        if !std::thread::panicking() && self.depth > 0 {
            panic!("DepthCounter dropped with depth {}", self.depth);
        }
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
