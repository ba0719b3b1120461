//! Forces a thread-shared thunk. This component's eventual contract is
//! specified in full below but shipped as a stub for now, delegating to
//! `force_local`. This module exists to hold that contract and the
//! reserved tag it depends on, not to implement concurrency.

use crate::block::{Block, BoxedValue, LAZY_PREP};
use crate::evaluator::{EvaluatorRef, YieldFlag};
use crate::local::force_local;

/// Evaluate a thunk whose refcount encodes thread-sharing.
///
/// **Specified contract (future-complete version).**
/// Semantically equivalent to [`force_local`], but all mutations on `b`
/// must be linearizable against other forcing threads:
///
/// 1. Copy `b` to a fresh block `x` with refcount 1.
/// 2. Atomically install on `b` either a blackhole with an attached waiter
///    list, or — via the reserved [`LAZY_PREP`] tag — a two-phase
///    prepare/commit encoding of the waiter list. The first writer wins;
///    any other thread racing to force `b` must detect that it lost and
///    drop its own `x`, then chase whatever got installed instead.
/// 3. Evaluate `x` (off the lock, so other threads can keep discovering
///    the in-progress blackhole).
/// 4. Atomically transition `b` to `LAZY_IND` pointing at the result and
///    wake all waiters.
///
/// Recursion by the same thread must still be detected on this path (the
/// blackhole predicate still holds across it) and still yields a
/// pattern-match failure, exactly as on the local path.
///
/// **Current implementation.** Delegates entirely to [`force_local`]. This
/// preserves the external contract and is correct for single-threaded use;
/// for genuinely multi-threaded use it degrades to potential duplicate
/// evaluation of the same thunk rather than crashing. [`LAZY_PREP`] stays
/// reserved and unconstructed until this is implemented for real.
pub fn force_shared(b: Block, evaluator: &EvaluatorRef, yld: &YieldFlag) -> BoxedValue {
    tracing::debug!(
        tag = b.tag(),
        "thread-shared thunk forced via the local-protocol stub"
    );
    let _ = LAZY_PREP; // reserved; never constructed by this stub
    force_local(b, evaluator, yld)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{is_blackhole, LAZY_IND, LAZY_MIN};
    use std::rc::Rc;

    #[test]
    fn stub_behaves_like_local_for_single_threaded_callers() {
        let b = Block::alloc(LAZY_MIN + 1, vec![BoxedValue::Immediate(9)]);
        b.mark_thread_shared();
        let alias = b.clone();

        let evaluator: EvaluatorRef =
            Rc::new(|_arg: BoxedValue, _y: &YieldFlag| BoxedValue::Immediate(99));
        let yld = YieldFlag::new();

        let result = force_shared(b, &evaluator, &yld);
        let result_ptr = result.into_ptr().expect("indirection is a pointer");
        assert_eq!(result_ptr.tag(), LAZY_IND);
        assert!(!is_blackhole(&alias));
    }
}
