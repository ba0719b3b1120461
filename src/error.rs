//! The two failure kinds this crate's force protocol can surface.

use thiserror::Error;

/// Failures surfaced by [`crate::force::force`] / [`crate::force::eval`].
///
/// There is deliberately no variant for "recursive thunk": that case is
/// not an error at this layer. The driver returns a pointer to the
/// blackhole block, and it is the downstream pattern match against a
/// non-constructor tag that raises the runtime's standard pattern-match
/// failure — a concern of the caller, not of this crate.
#[derive(Debug, Error)]
pub enum ForceError {
    /// The evaluator attempted to yield (suspend) the thread it is running
    /// on. Unsupported for now; a future extension will replace this with
    /// a proper suspend/resume via the runtime's `yield_extend` hook.
    #[error("yielding from inside a lazy constructor is currently not supported")]
    Yielding,
}
