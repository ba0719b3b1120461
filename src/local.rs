//! Forces a thunk with refcount > 0 that is not thread-shared.

use crate::block::{is_blackhole, Block, BoxedValue, LAZY_EVAL, LAZY_IND};
use crate::evaluator::{EvaluatorRef, YieldFlag};
use crate::heap;

/// Install an indirection from `target` to `result`, or free `target` and
/// return `result` directly if `target` turned out to be uniquely owned by
/// the time this runs.
///
/// This is the "install indirection" primitive exposed externally as
/// `indirect(target, result) -> value`, usable both inlined here by
/// [`force_local`] and externally by code-generated evaluator epilogues
/// that want to memoize a result into a thunk slot without going through
/// the full force protocol.
pub fn indirect(target: Block, result: BoxedValue) -> BoxedValue {
    if target.is_unique() {
        heap::free(target);
        result
    } else {
        target.field_set(0, result);
        target.set_scan_fsize(1);
        target.set_tag(LAZY_IND);
        BoxedValue::Ptr(target)
    }
}

/// Evaluate a thunk with `refcount(b) > 0` that is not thread-shared.
///
/// **Precondition.** `refcount(b) > 0`, not thread-shared, `is_lazy_block(b)`.
///
/// **Behavior**:
/// 1. If `b` is already a blackhole, return it unchanged — a downstream
///    pattern match against it will raise the runtime's standard
///    pattern-match failure, which is how recursive forcing on the same
///    thread is surfaced.
/// 2. Otherwise: copy `b`'s payload out into a fresh, uniquely owned block
///    `x`; overwrite `b` in place with the blackhole tag; invoke the
///    evaluator on `x`; fail if it tried to yield; install an indirection
///    from `b` to the result and return `b` (the caller's driver loop will
///    follow it).
pub fn force_local(b: Block, evaluator: &EvaluatorRef, yld: &YieldFlag) -> BoxedValue {
    debug_assert!(!b.is_unique(), "force_local on a uniquely owned block");

    if is_blackhole(&b) {
        tracing::trace!(tag = b.tag(), "encountered blackhole: recursive force");
        return BoxedValue::Ptr(b);
    }

    // Copy and overwrite the block with a blackhole. We need to copy since
    // we use a tag for the blackhole, but must pass the original payload
    // to `eval`. If the argument reused `b` directly, any alias of `b`
    // observed by a recursive call from inside `eval` would see a
    // half-evaluated mess instead of the thunk it expects.
    let x = heap::alloc_copy(&b);
    b.set_tag(LAZY_EVAL);
    b.set_scan_fsize(0);

    tracing::trace!(tag = x.tag(), "blackholed thunk; invoking evaluator");
    let res = evaluator.call(BoxedValue::Ptr(x), yld);

    if yld.is_yielding() {
        // Caller (force.rs) turns this into a `ForceError::Yielding`; we
        // still return *something* structurally valid so `b` is left as a
        // blackhole rather than half-way through becoming an indirection.
        return BoxedValue::Ptr(b);
    }

    // The evaluator may itself re-force `b` through some other alias it
    // holds (the classic self-referential thunk, e.g. `rec x = lazy(force
    // x)`). That nested force call hits the blackhole check above (on its
    // own recursive entry) and hands the still-blackholed `b` straight
    // back out. If we let that flow into the unconditional install below,
    // we'd overwrite `b`'s blackhole tag with `LAZY_IND` pointing at
    // itself — a self-loop the driver would chase forever instead of
    // recognizing as recursion. Recognize it here and propagate the
    // blackhole unchanged instead.
    if let BoxedValue::Ptr(ref rp) = res {
        if rp.ptr_eq(&b) && is_blackhole(rp) {
            tracing::trace!("evaluator re-forced its own thunk; propagating blackhole");
            return res;
        }
    }

    indirect(b, res)
}
