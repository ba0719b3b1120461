//! The evaluator contract and the `dup`/`drop` discipline the driver
//! maintains around it.

use std::rc::Rc;

use crate::block::BoxedValue;

/// Side channel standing in for the effect system's yielding signal. An
/// evaluator that needs to suspend the thread marks this instead of being
/// able to actually suspend, since the effect-yielding machinery itself is
/// out of scope here.
#[derive(Default)]
pub struct YieldFlag {
    yielding: std::cell::Cell<bool>,
}

impl YieldFlag {
    pub fn new() -> YieldFlag {
        YieldFlag::default()
    }

    /// Called by an evaluator that wants to suspend. The driver checks this
    /// immediately after every evaluator invocation and fails fatally if set.
    pub fn mark_yielding(&self) {
        self.yielding.set(true);
    }

    pub fn is_yielding(&self) -> bool {
        self.yielding.get()
    }
}

/// `(BoxedValue) -> BoxedValue`, the caller-supplied function that turns a
/// lazy block into its evaluated form.
///
/// By contract the argument is always a pointer to a lazy block (either the
/// original, if unique, or a freshly allocated copy of it, if not); the
/// return value is either a fully evaluated constructor, another lazy block,
/// or an indirection. Implementations must not store the argument past the
/// call — the copy-and-blackhole trick in [`crate::local`] depends on that.
pub trait Evaluator {
    fn call(&self, arg: BoxedValue, yld: &YieldFlag) -> BoxedValue;
}

impl<F> Evaluator for F
where
    F: Fn(BoxedValue, &YieldFlag) -> BoxedValue,
{
    fn call(&self, arg: BoxedValue, yld: &YieldFlag) -> BoxedValue {
        self(arg, yld)
    }
}

/// A shared handle to an [`Evaluator`]. Generated per lazy constructor type
/// in a real compiler; here just `Rc`-shared so the driver can hand it down
/// into a recursive `force` call from within the evaluator's own body.
pub type EvaluatorRef = Rc<dyn Evaluator>;

/// `kk_function_static_dup`: duplicate the evaluator reference across a
/// dispatch that may recursively reenter `force`.
///
/// Generated evaluators are assumed *static* (a plain function, not a
/// closure capturing reference-counted state), in which case dup is a
/// no-op. `Rc::clone` is cheap enough that this crate performs a genuine
/// dup unconditionally rather than special-casing the static case, so
/// non-static (closure-capturing) evaluators stay sound too.
#[inline]
pub fn static_dup(e: &EvaluatorRef) -> EvaluatorRef {
    e.clone()
}

/// `kk_function_static_drop`: balance a prior [`static_dup`]. A plain
/// `drop`, kept as a named function so the driver's loop reads the same
/// shape as the dup/drop-paired dispatch it balances.
#[inline]
pub fn static_drop(e: EvaluatorRef) {
    drop(e);
}
