//! The external collaborator boundary: block allocation, refcounting, and
//! field access, as consumed by the force driver and evaluators.
//!
//! The heap block header, tag layout, and allocator live outside this
//! crate; this module consumes them only through a fixed vocabulary of
//! operations: `alloc_copy`, `free`, `decref`, `refcount`, `tag`, field
//! read/write. This module is the seam those operations live behind. A
//! production runtime would back it with a real generational or
//! refcounted heap; here it is a thin, direct mapping onto
//! [`crate::block::Block`]'s `Rc`-backed storage, sufficient to make the
//! driver's refcount-discriminated dispatch observable and testable on its
//! own.

use crate::block::{Block, BoxedValue};

/// `alloc_copy(b)`: allocate a fresh, uniquely owned copy of `b` with the
/// same tag, fields, and scan size. Used by `force_local` to move a
/// thunk's payload out from under the blackhole it is about to install.
pub fn alloc_copy(b: &Block) -> Block {
    let fields: Vec<BoxedValue> = (0..b.field_count()).map(|i| b.field(i)).collect();
    let copy = Block::alloc(b.tag(), fields);
    copy.set_scan_fsize(b.scan_fsize());
    copy
}

/// `free(b)`: reclaim a uniquely owned block. Debug builds assert the
/// uniqueness precondition; in this `Rc`-backed heap, dropping the last
/// handle already performs the reclamation, so `free` is this crate's name
/// for that drop, kept as a distinct named operation to mirror the
/// external interface lists.
pub fn free(b: Block) {
    debug_assert!(b.is_unique(), "free() called on a non-unique block");
    drop(b);
}

/// `decref(b)`: drop one alias to `b` without asserting uniqueness. Used
/// when chasing an indirection whose forwarded value has already been
/// `dup`'d to account for the reference the driver is about to drop.
pub fn decref(b: Block) {
    drop(b);
}

/// `dup(v)`: hand out one more reference to a boxed value. A no-op on
/// immediates; clones the `Block` handle (incrementing its refcount) for
/// pointers.
pub fn dup(v: BoxedValue) -> BoxedValue {
    match v {
        BoxedValue::Ptr(b) => BoxedValue::Ptr(b.clone()),
        imm @ BoxedValue::Immediate(_) => imm,
    }
}

/// `refcount(b)`: the number of aliases other than the handle in hand.
pub fn refcount(b: &Block) -> u32 {
    b.refcount()
}

/// `is_unique(b)`: `refcount(b) == 0`.
pub fn is_unique(b: &Block) -> bool {
    b.is_unique()
}

/// `is_thread_shared(b)`: whether `b`'s refcount encodes thread-sharing.
///
/// On a genuine multi-threaded heap this is a bit reserved in the refcount
/// word itself. This heap is single-threaded (`Block` is `Rc`-backed, not
/// `Arc`-backed), so the condition is tracked out of band via
/// [`Block::mark_thread_shared`] purely so the `force_shared` dispatch
/// path in the force driver is reachable and testable.
pub fn is_thread_shared(b: &Block) -> bool {
    b.is_thread_shared_flag()
}

/// `tag(b)` / `field(b, i)` / `field_set(b, i, v)`: header and field
/// access. Thin re-exports of the corresponding `Block` methods, kept here
/// so call sites in `force`/`local`/`unique`/`shared` read as operations on
/// "the heap" rather than reaching into `Block` directly.
pub fn tag(b: &Block) -> u32 {
    b.tag()
}

pub fn field(b: &Block, i: usize) -> BoxedValue {
    b.field(i)
}

/// `field` without creating a new alias; see [`Block::take_field`]. Used by
/// the driver when chasing an indirection it is about to [`free`], so the
/// forwarded value's refcount is left untouched.
pub fn take_field(b: &Block, i: usize) -> BoxedValue {
    b.take_field(i)
}

pub fn field_set(b: &Block, i: usize, v: BoxedValue) {
    b.field_set(i, v);
}
