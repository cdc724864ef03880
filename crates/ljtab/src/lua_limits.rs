//! Table sizing limits and tuning constants.
//!
//! Every magic number that controls how a table grows is collected here
//! so the policy can be tuned in one place.

// ===== Array part =====

/// Number of population bins used when sizing the array part.
/// Bin 0 counts key 0, bin `b >= 1` counts keys in `[2^(b-1), 2^b)`.
pub const MAX_ABITS: usize = 28;

/// Largest array part a resize will ever choose (`2^(MAX_ABITS - 1)` slots).
/// Integer keys at or above it always live in the hash part.
pub const MAX_ASIZE: u32 = 1 << (MAX_ABITS - 1);

/// Smallest array part created by the append fast path.
pub const MIN_ARRAY_GROW: u32 = 4;

// ===== Hash part =====

/// Largest hash part, as log2 of the node count.
pub const MAX_HBITS: u32 = 26;
