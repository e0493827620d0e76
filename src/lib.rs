//! Owning, fixed-length arrays with pluggable disposal.
//!
//! An [`Array`] owns a pointer, a length and the strategy that releases them. The strategy
//! can be the global allocator, a custom [`ArrayDisposer`], or nothing at all, and any owned
//! values can be [attached](Array::attach) to it so they are released right after the elements.
//! [`ArrayPtr`] and [`ArrayPtrMut`] are borrowed windows into such storage, and
//! [`ArrayBuilder`] constructs an array one element at a time without ever counting a slot
//! whose constructor did not finish.
//!
//! Element destructors that panic never stop the release of the rest of a block: every
//! element is dropped, the storage is released, and only then the first panic continues.
//!
//! Enable the `logging` feature to trace allocations and disposal through the `log` crate.

#[macro_use]
mod logging;
mod error;
mod disposer;
mod heap;
mod array;
mod array_ptr;
mod builder;
mod attach;
mod reinterpret;
mod traits;

pub use error::ArrayError;
pub use disposer::{destroy_elements, destroy_fn, ArrayDisposer, DestroyFn, Panic};
pub use array::Array;
pub use array_ptr::{ArrayPtr, ArrayPtrMut, FromArrayPtr, FromArrayPtrMut};
pub use builder::{heap_array_builder, ArrayBuilder};
pub use reinterpret::LayoutCompatible;
pub use traits::ArrayIterator;

#[cfg(test)]
pub mod dropflag;
