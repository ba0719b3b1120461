//! The heap block data model and the tag/predicate layer.
//!
//! A [`Block`] is a cheap handle onto reference-counted, interior-mutable
//! storage. The handle itself is `Clone`, and cloning it is exactly the
//! `dup` operation `heap` exposes to the rest of the crate: it increments
//! the block's refcount.
//!
//! Besides for first-class constructor contexts and stackless freeing (not
//! modeled here, see `cpath` below), the lazy layer reuses a couple of
//! header fields that exist for other reasons. This is fine: lazy values
//! never participate in those other protocols.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Tags below this sentinel mark ordinary, fully evaluated constructors.
/// Tags at or above it are in the lazy range: per-type `LAZY_T` constructor
/// tags (a thunk awaiting its first evaluation) occupy `LAZY_MIN..LAZY_EVAL`,
/// with the three distinguished tags reserved at the very top of the tag
/// space so they can never collide with a real generated lazy-constructor
/// tag.
pub const LAZY_MIN: u32 = 0x8000_0000;

/// The blackhole marker: a thunk currently under evaluation on this thread.
pub const LAZY_EVAL: u32 = u32::MAX - 2;

/// The indirection marker: a thunk that has been evaluated and now forwards
/// to its result in field 0.
pub const LAZY_IND: u32 = u32::MAX - 1;

/// Reserved for the thread-shared protocol's two-phase prepare/commit
/// encoding. Never constructed by the local protocol.
pub const LAZY_PREP: u32 = u32::MAX;

/// A boxed value: either an immediate (unboxed) integer or a pointer to a
/// [`Block`]. This stands in for the target language's real boxing scheme,
/// which is out of scope.
#[derive(Clone)]
pub enum BoxedValue {
    /// An unboxed scalar. Never lazy, never forwarded.
    Immediate(i64),
    /// A pointer to a heap block, possibly lazy.
    Ptr(Block),
}

impl BoxedValue {
    /// `box(ptr)`: wrap a block pointer as a boxed value.
    pub fn boxed(ptr: Block) -> BoxedValue {
        BoxedValue::Ptr(ptr)
    }

    /// Is this boxed value a pointer (as opposed to an immediate)?
    pub fn is_pointer(&self) -> bool {
        matches!(self, BoxedValue::Ptr(_))
    }

    /// `unbox(box) -> ptr_or_immediate`: get at the pointer, if any.
    pub fn as_ptr(&self) -> Option<&Block> {
        match self {
            BoxedValue::Ptr(b) => Some(b),
            BoxedValue::Immediate(_) => None,
        }
    }

    pub fn into_ptr(self) -> Result<Block, BoxedValue> {
        match self {
            BoxedValue::Ptr(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl fmt::Debug for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxedValue::Immediate(v) => write!(f, "Immediate({v})"),
            BoxedValue::Ptr(b) => write!(f, "Ptr(tag={:#x})", b.tag()),
        }
    }
}

/// The mutable header-and-fields state of a heap block. Kept behind a
/// `RefCell` because the lazy protocol mutates a block's tag and fields
/// while other `Block` handles to the same allocation may be alive.
pub(crate) struct BlockInner {
    tag: u32,
    /// Number of leading fields that are managed (scannable) pointers.
    scan_fsize: u32,
    /// Auxiliary header bit reused by the lazy layer; see the module doc.
    /// Not touched by anything in this crate beyond being copied along.
    cpath: u8,
    fields: Vec<BoxedValue>,
    /// Synthetic stand-in for the reserved high bit of a real refcount word
    /// that marks a block as thread-shared. A genuine multi-threaded heap
    /// would derive this from the refcount representation itself; since
    /// `Block` is `Rc`-backed (and therefore confined to one thread), this
    /// flag exists only so tests can exercise the `force_shared` dispatch
    /// path without requiring real cross-thread sharing.
    thread_shared: bool,
}

/// A reference-counted heap block.
///
/// Cloning a `Block` is the `dup` operation: it hands out another alias and
/// increments the refcount observed by [`crate::heap::refcount`].
#[derive(Clone)]
pub struct Block(pub(crate) Rc<RefCell<BlockInner>>);

impl Block {
    /// Allocate a fresh block with the given tag and fields. `scan_fsize` is
    /// set to `fields.len()`, i.e. every field is assumed scannable; callers
    /// needing otherwise should adjust via [`Block::set_scan_fsize`].
    pub fn alloc(tag: u32, fields: Vec<BoxedValue>) -> Block {
        let scan_fsize = fields.len() as u32;
        Block(Rc::new(RefCell::new(BlockInner {
            tag,
            scan_fsize,
            cpath: 0,
            fields,
            thread_shared: false,
        })))
    }

    pub fn tag(&self) -> u32 {
        self.0.borrow().tag
    }

    pub fn set_tag(&self, tag: u32) {
        self.0.borrow_mut().tag = tag;
    }

    pub fn scan_fsize(&self) -> u32 {
        self.0.borrow().scan_fsize
    }

    pub fn set_scan_fsize(&self, n: u32) {
        self.0.borrow_mut().scan_fsize = n;
    }

    pub fn cpath(&self) -> u8 {
        self.0.borrow().cpath
    }

    /// Read field `i`, handing out a fresh alias (a combined unbox+dup: the
    /// slot keeps its own reference, the caller gets an independent one).
    pub fn field(&self, i: usize) -> BoxedValue {
        self.0.borrow().fields[i].clone()
    }

    /// Move field `i` out, leaving a harmless placeholder behind. Unlike
    /// [`Block::field`], this does not create a new alias: ownership simply
    /// transfers from the slot to the caller. Only sound to use when the
    /// block itself is about to be reclaimed (see `heap::free`'s callers),
    /// since any other alias of this block would otherwise observe its
    /// field silently replaced.
    pub fn take_field(&self, i: usize) -> BoxedValue {
        std::mem::replace(&mut self.0.borrow_mut().fields[i], BoxedValue::Immediate(0))
    }

    pub fn field_set(&self, i: usize, v: BoxedValue) {
        let mut inner = self.0.borrow_mut();
        if i >= inner.fields.len() {
            inner.fields.resize(i + 1, BoxedValue::Immediate(0));
        }
        inner.fields[i] = v;
    }

    pub fn field_count(&self) -> usize {
        self.0.borrow().fields.len()
    }

    /// Mark this block as thread-shared. See [`BlockInner::thread_shared`].
    pub fn mark_thread_shared(&self) {
        self.0.borrow_mut().thread_shared = true;
    }

    pub(crate) fn is_thread_shared_flag(&self) -> bool {
        self.0.borrow().thread_shared
    }

    /// True if this handle is the sole owner of the block, i.e. no other
    /// alias exists. `Rc::strong_count` counts this handle too, hence `- 1`:
    /// a `refcount` of `0` means "no *other* aliases".
    pub fn is_unique(&self) -> bool {
        Rc::strong_count(&self.0) == 1
    }

    /// The number of aliases *other than this handle*.
    pub fn refcount(&self) -> u32 {
        (Rc::strong_count(&self.0) - 1) as u32
    }

    pub fn ptr_eq(&self, other: &Block) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A stable identity for this allocation, usable to recognize "is this
    /// the same block" across a call that consumes the handle, without
    /// keeping a redundant alias alive just to ask `ptr_eq` later (an extra
    /// alias would itself perturb the refcount the driver dispatches on.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

/// `is_lazy_block(b)`: `tag(b)` lies in the lazy range.
///
/// Computes the same comparison as [`is_lazy_or_special`] today (the lazy
/// range currently extends to the top of the tag space), but the two are
/// kept as distinct functions because they carry different contracts: this
/// one is the checked classification used wherever the caller has not
/// already established that the static type is lazy (e.g. `eval`'s
/// precondition check), while `is_lazy_or_special` is the fast test used
/// only where that has already been established. Merging them would erase
/// that distinction silently.
#[inline]
pub fn is_lazy_block(b: &Block) -> bool {
    b.tag() >= LAZY_MIN
}

/// `is_blackhole(b)`: `tag(b) == LAZY_EVAL`.
#[inline]
pub fn is_blackhole(b: &Block) -> bool {
    b.tag() == LAZY_EVAL
}

/// `is_lazy_value(v)`: `v` is a pointer value and its block is lazy.
#[inline]
pub fn is_lazy_value(v: &BoxedValue) -> bool {
    match v {
        BoxedValue::Ptr(b) => is_lazy_block(b),
        BoxedValue::Immediate(_) => false,
    }
}

/// `is_lazy_or_special(b)`: `tag(b) >= LAZY_MIN`.
///
/// The single-compare fast test for *typed* lazy data:
/// callers only invoke it when the static type is known lazy, so any tag
/// above the sentinel is conclusive without needing the upper-bound check
/// `is_lazy_block` performs.
#[inline(always)]
pub fn is_lazy_or_special(b: &Block) -> bool {
    b.tag() >= LAZY_MIN
}
