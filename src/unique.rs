//! Forces a thunk with refcount 0 (sole owner).

use crate::block::{is_blackhole, is_lazy_block, Block, BoxedValue};
use crate::evaluator::{EvaluatorRef, YieldFlag};

/// Evaluate a uniquely owned thunk.
///
/// **Precondition.** `refcount(b) == 0`, `is_lazy_block(b)`,
/// `!is_blackhole(b)`.
///
/// **Behavior.** Invoke the evaluator with a boxed pointer to `b` and
/// return the result directly. No blackhole is installed and no
/// indirection is created: because `b` is unique there is no alias that
/// could observe the transition, and the generated evaluator does not
/// expose `b` to user code except as the scrutinee of a match, so no
/// recursive reentry through an alias is possible. This saves an
/// allocation and a mutation in the common case of strictly linear
/// consumption of thunks.
///
/// Whether a unique thunk can ever already be a blackhole is really an
/// assumption about code generation, not a checked invariant, and
/// implementers can choose whether to re-verify it. This crate
/// re-establishes it defensively with a debug assertion on entry rather
/// than inspecting the evaluator's captures at runtime (see `DESIGN.md`).
pub fn force_unique(b: Block, evaluator: &EvaluatorRef, yld: &YieldFlag) -> BoxedValue {
    debug_assert_eq!(b.refcount(), 0, "force_unique on a non-unique block");
    debug_assert!(is_lazy_block(&b), "force_unique on a non-lazy block");
    debug_assert!(
        !is_blackhole(&b),
        "a unique thunk cannot already be a blackhole"
    );

    tracing::trace!(tag = b.tag(), "forcing unique thunk");
    evaluator.call(BoxedValue::Ptr(b), yld)
}
