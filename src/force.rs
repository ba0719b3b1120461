//! The force driver, and the crate's external interface.

use crate::block::{is_blackhole, is_lazy_block, is_lazy_or_special, is_lazy_value, Block, BoxedValue};
use crate::error::ForceError;
use crate::evaluator::{static_drop, static_dup, EvaluatorRef, YieldFlag};
use crate::heap;
use crate::local;
use crate::shared;
use crate::unique;

/// `is_lazy(value)`: fast predicate on a boxed value.
///
/// Wraps [`is_lazy_or_special`] after unboxing — the same one-compare fast
/// test `force`'s cheap pre-check uses, exposed standalone for callers
/// that only want the predicate.
pub fn is_lazy(value: &BoxedValue) -> bool {
    match value {
        BoxedValue::Ptr(b) => is_lazy_or_special(b),
        BoxedValue::Immediate(_) => false,
    }
}

/// `force(value, evaluator) -> value`: unconditional force.
///
/// Performs the cheap [`is_lazy_or_special`] pre-check first. If `value`
/// is not (typed-)lazy, the evaluator is dropped without ever being
/// invoked and `value` is returned unchanged — this is the one place an
/// `eval` closure can be supplied and never called.
/// Otherwise, delegates to [`eval`].
pub fn force(value: BoxedValue, evaluator: EvaluatorRef) -> Result<BoxedValue, ForceError> {
    if !is_lazy(&value) {
        static_drop(evaluator);
        return Ok(value);
    }
    eval(value, evaluator)
}

/// `eval(value, evaluator) -> value`: precondition-checked force.
///
/// **Precondition.** `is_lazy_value(value)`. Debug builds assert this;
/// release builds trust the caller, matching `kk_assert`'s debug-only
/// semantics.
///
/// Iteratively dispatches to `force_unique`/`force_local`/`force_shared`
/// and chases indirections until the result is a non-lazy value or a
/// blackhole. The loop is iterative, not recursive, so indirection
/// chains of arbitrary length collapse in O(1) stack depth.
pub fn eval(value: BoxedValue, evaluator: EvaluatorRef) -> Result<BoxedValue, ForceError> {
    debug_assert!(is_lazy_value(&value), "eval() precondition violated");

    let mut current: Block = value.into_ptr().expect("is_lazy_value guarantees a pointer");

    loop {
        let tag = heap::tag(&current);
        let rc = heap::refcount(&current);

        let next = if tag == crate::block::LAZY_IND {
            if rc == 0 {
                let forwarded = heap::take_field(&current, 0);
                heap::free(current);
                forwarded
            } else {
                let forwarded = heap::field(&current, 0);
                heap::decref(current);
                forwarded
            }
        } else {
            // Preserve the evaluator across this dispatch: it may
            // recursively invoke `eval` on sub-thunks from its own body.
            // A calling convention where invoking a function consumes one
            // of its references would dup once before the loop and drop
            // once after it; `Evaluator::call` here takes `&self` instead,
            // so the dup/drop pair is bracketed around each dispatch
            // rather than the whole loop. Either shape costs the same: one
            // alias in, one alias out, free in the common (non-closure)
            // case.
            //
            // `watch_addr` records this block's identity *before* handing
            // it off to dispatch, so the blackhole short-circuit below can
            // recognize "the evaluator gave me back the same block" without
            // keeping an extra alias alive — an extra alias here would
            // itself change the refcount `rc` just computed, corrupting the
            // very dispatch decision being made from it.
            let watch_addr = current.addr();
            let is_shared = heap::is_thread_shared(&current);
            let evaluator_dup = static_dup(&evaluator);
            let yld = YieldFlag::new();

            let res = if rc == 0 {
                unique::force_unique(current, &evaluator_dup, &yld)
            } else if is_shared {
                shared::force_shared(current, &evaluator_dup, &yld)
            } else {
                local::force_local(current, &evaluator_dup, &yld)
            };

            static_drop(evaluator_dup);

            if yld.is_yielding() {
                static_drop(evaluator);
                return Err(ForceError::Yielding);
            }

            if let BoxedValue::Ptr(ref p) = res {
                if p.addr() == watch_addr && is_blackhole(p) {
                    // The evaluator returned the blackhole it was itself
                    // handed — recursive forcing. Stop; re-entering would
                    // loop forever.
                    static_drop(evaluator);
                    return Ok(res);
                }
            }

            res
        };

        match next {
            BoxedValue::Ptr(p) if is_lazy_block(&p) => {
                current = p;
            }
            other => {
                static_drop(evaluator);
                return Ok(other);
            }
        }
    }
}

/// `indirect(target, result) -> value`: re-exported from [`crate::local`]
/// as the crate's external "install indirection" primitive, usable
/// directly by generated evaluator epilogues.
pub use crate::local::indirect as indirect_into;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BoxedValue, LAZY_IND, LAZY_MIN};
    use std::cell::Cell;
    use std::rc::Rc;

    fn evaluator_returning(v: i64) -> EvaluatorRef {
        Rc::new(move |_arg: BoxedValue, _y: &YieldFlag| BoxedValue::Immediate(v))
    }

    #[test]
    fn force_on_non_lazy_value_is_a_no_op_and_drops_evaluator() {
        let dropped = Rc::new(Cell::new(false));
        struct DropSignal(Rc<Cell<bool>>);
        impl Drop for DropSignal {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }
        struct NeverCall(DropSignal);
        impl crate::evaluator::Evaluator for NeverCall {
            fn call(&self, _arg: BoxedValue, _yld: &YieldFlag) -> BoxedValue {
                panic!("evaluator must not be called on an already-evaluated value")
            }
        }
        let evaluator: EvaluatorRef = Rc::new(NeverCall(DropSignal(dropped.clone())));

        let value = BoxedValue::Immediate(7);
        let result = force(value, evaluator).unwrap();
        match result {
            BoxedValue::Immediate(7) => {}
            _ => panic!("value should pass through unchanged"),
        }
        assert!(dropped.get(), "evaluator should have been dropped, not invoked");
    }

    #[test]
    fn unique_leaf_evaluates_without_copying() {
        let thunk = Block::alloc(LAZY_MIN + 1, vec![BoxedValue::Immediate(3)]);
        assert!(thunk.is_unique());
        let evaluator = evaluator_returning(3);
        let result = eval(BoxedValue::Ptr(thunk), evaluator).unwrap();
        match result {
            BoxedValue::Immediate(3) => {}
            _ => panic!("expected the evaluated value"),
        }
    }

    #[test]
    fn indirection_chain_collapses() {
        // b1 -> LAZY_IND -> b2 -> LAZY_IND -> v
        let v = Block::alloc(1, vec![BoxedValue::Immediate(42)]);
        let b2 = Block::alloc(LAZY_IND, vec![BoxedValue::Ptr(v.clone())]);
        b2.set_scan_fsize(1);
        let b1 = Block::alloc(LAZY_IND, vec![BoxedValue::Ptr(b2)]);
        b1.set_scan_fsize(1);

        assert!(b1.is_unique());
        let evaluator = evaluator_returning(0); // never called: no LAZY_T tag present
        let result = eval(BoxedValue::Ptr(b1), evaluator).unwrap();
        let result_ptr = result.into_ptr().expect("should resolve to the Cons block");
        assert!(result_ptr.ptr_eq(&v));
    }

    #[test]
    fn multi_step_forcing_chases_each_new_thunk() {
        // e(b) returns a new lazy thunk b', e(b') returns 42.
        let calls = Rc::new(Cell::new(0));
        let calls2 = calls.clone();
        let evaluator: EvaluatorRef = Rc::new(move |arg: BoxedValue, _y: &YieldFlag| {
            let n = calls2.get();
            calls2.set(n + 1);
            if n == 0 {
                let inner = Block::alloc(LAZY_MIN + 2, vec![]);
                BoxedValue::Ptr(inner)
            } else {
                let _ = arg;
                BoxedValue::Immediate(42)
            }
        });

        let outer = Block::alloc(LAZY_MIN + 1, vec![]);
        let result = eval(BoxedValue::Ptr(outer), evaluator).unwrap();
        match result {
            BoxedValue::Immediate(42) => {}
            _ => panic!("expected 42 after chasing through the inner thunk"),
        }
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn recursion_returns_blackhole() {
        // A self-referential thunk: `rec x = lazy(force(x))`. The evaluator
        // ignores the copy it is handed (the argument convention guarantees
        // it is never the original) and instead re-forces `b` through an
        // alias it captured when the thunk was built — exactly how a
        // compiled self-reference would close over its own binding.
        struct SelfForce {
            target: Block,
        }
        impl crate::evaluator::Evaluator for SelfForce {
            fn call(&self, _arg: BoxedValue, _yld: &YieldFlag) -> BoxedValue {
                let inert: EvaluatorRef =
                    Rc::new(|_arg: BoxedValue, _y: &YieldFlag| unreachable!("never reached: the recursive force short-circuits on the blackhole before dispatching again"));
                match eval(BoxedValue::Ptr(self.target.clone()), inert) {
                    Ok(v) => v,
                    Err(_) => BoxedValue::Immediate(-1),
                }
            }
        }

        let b = Block::alloc(LAZY_MIN + 3, vec![]);
        let alias = b.clone(); // refcount 1: dispatched via force_local, not force_unique
        let evaluator: EvaluatorRef = Rc::new(SelfForce {
            target: alias.clone(),
        });

        let result = eval(BoxedValue::Ptr(b), evaluator).unwrap();
        let result_ptr = result.into_ptr().expect("blackhole is a pointer");
        assert!(is_blackhole(&result_ptr));
        assert!(result_ptr.ptr_eq(&alias));
    }
}
