//! Centralized limits and thresholds for the type introspection engine.
//!
//! Shared constants for cache sizing, parser nesting and hierarchy walks.
//! Keeping them in one place avoids duplicate definitions with inconsistent
//! values between the host model and the solver.
//!
//! # Solver recursion limits
//!
//! Recursion limits for type resolution and specialization are centralized in
//! `typeinfo_solver::recursion::RecursionProfile` rather than here. The
//! profiles are the single source of truth for solver recursion.

// =============================================================================
// Cache Limits
// =============================================================================

/// Initial capacity of the process-wide descriptor cache.
///
/// Matches the number of slots a freshly started application typically needs
/// for its well-known types plus the repository interfaces registered at
/// bootstrap.
pub const TYPE_CACHE_INITIAL_CAPACITY: usize = 64;

/// Number of cache insertions between opportunistic sweeps of stale entries.
///
/// Entries whose loader or descriptor has been dropped are unreachable but
/// still occupy a slot until a sweep runs. Sweeping on insertion keeps the
/// map bounded without a background thread.
pub const CACHE_SWEEP_INTERVAL: u64 = 64;

// =============================================================================
// Host Model Limits
// =============================================================================

/// Maximum nesting of generic argument lists in a declared signature.
///
/// `Map<String, List<Set<Optional<Person>>>>` nests four levels deep. The
/// parser rejects anything deeper than this with `HostError::NestingTooDeep`
/// instead of recursing without bound on malformed input.
pub const MAX_SIGNATURE_NESTING: u32 = 64;

/// Maximum number of declarations visited while walking a raw supertype
/// hierarchy.
///
/// Declared hierarchies are acyclic in well-formed input; the walk also keeps
/// a visited set, so this bound only protects against pathological fan-out.
pub const MAX_SUPERTYPE_WALK: u32 = 10_000;
