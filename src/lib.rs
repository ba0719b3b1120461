//! The thunk-forcing core of a lazy, reference-counted functional-language
//! runtime.
//!
//! A lazy value lives on the heap as a [`block::Block`] tagged somewhere in
//! the `LAZY` range. [`force::force`] turns such a block into its fully
//! evaluated form exactly once, no matter how many aliases later force it,
//! by mutating the block through the sequence `thunk -> blackhole ->
//! indirection`:
//!
//! * a uniquely owned thunk (`refcount == 0`) is evaluated in place with no
//!   extra allocation ([`unique::force_unique`]);
//! * a shared, same-thread thunk is blackholed, evaluated against a fresh
//!   copy of its payload, and then turned into an indirection
//!   ([`local::force_local`]);
//! * a thread-shared thunk currently delegates to the local path
//!   ([`shared::force_shared`]) pending a real atomic protocol.
//!
//! [`force::eval`] drives the dispatch iteratively, chasing indirection
//! chains of arbitrary length in constant stack depth and detecting
//! recursive (blackholed) forcing instead of looping forever.
//!
//! The block header, allocator, and boxing scheme are external
//! collaborators; this crate consumes them only through the narrow
//! vocabulary in [`heap`].

pub mod block;
pub mod error;
pub mod evaluator;
pub mod force;
pub mod heap;
pub mod local;
pub mod shared;
pub mod unique;

pub use crate::block::{
    is_blackhole, is_lazy_block, is_lazy_or_special, is_lazy_value, Block, BoxedValue, LAZY_EVAL,
    LAZY_IND, LAZY_MIN, LAZY_PREP,
};

pub use crate::error::ForceError;
pub use crate::evaluator::{Evaluator, EvaluatorRef, YieldFlag};
pub use crate::force::{eval, force, indirect_into, is_lazy};
