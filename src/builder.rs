use std::fmt::Debug;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::{Array, ArrayDisposer, ArrayError};
use crate::disposer::{destroy_fn, propagate, Disposal};
use crate::error::violated;
use crate::heap::{allocate, HeapDisposer};

/// Storage for a fixed number of elements that are constructed one at a time.
///
/// Slots `0..len` hold constructed elements, slots `len..capacity` are uninitialized.
/// `len` only advances after an element was fully written, so a panicking or failing
/// constructor never leaves a half-counted slot behind. Dropping the builder drops the
/// constructed prefix and releases the storage.
pub struct ArrayBuilder<T> {
    ptr: NonNull<T>,
    len: usize,
    capacity: usize,
    disposal: Disposal,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send> Send for ArrayBuilder<T> {}
unsafe impl<T: Sync> Sync for ArrayBuilder<T> {}

/// Allocates a builder for `capacity` elements on the heap.
#[inline(always)]
pub fn heap_array_builder<T>(capacity: usize) -> ArrayBuilder<T> {
    ArrayBuilder::with_capacity(capacity)
}

impl<T> ArrayBuilder<T> {
    pub fn with_capacity(capacity: usize) -> ArrayBuilder<T> {
        ArrayBuilder {
            ptr: allocate::<T>(capacity),
            len: 0,
            capacity,
            disposal: Disposal::Heap(HeapDisposer::new::<T>(capacity)),
            _marker: PhantomData,
        }
    }

    /// Builds into uninitialized storage obtained elsewhere, released by `disposer`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `capacity` elements and not used by anything else,
    /// and `disposer` must be able to release that block holding any prefix of constructed elements.
    pub unsafe fn from_raw_parts(ptr: NonNull<T>, capacity: usize, disposer: Box<dyn ArrayDisposer>) -> ArrayBuilder<T> {
        ArrayBuilder {
            ptr,
            len: 0,
            capacity,
            disposal: Disposal::Custom(disposer),
            _marker: PhantomData,
        }
    }

    /// Returns the number of constructed elements.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// The constructed prefix.
    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    #[inline(always)]
    fn check_room(&self, count: usize) -> Result<(), ArrayError> {
        if count > self.remaining() {
            Err(ArrayError::CapacityExceeded { capacity: self.capacity })
        } else {
            Ok(())
        }
    }

    #[inline(always)]
    unsafe fn push_unchecked(&mut self, value: T) -> &mut T {
        let slot = self.ptr.as_ptr().add(self.len);
        slot.write(value);
        self.len += 1;
        &mut *slot
    }

    /// Appends `value`. Panics if the builder is full.
    #[track_caller]
    pub fn add(&mut self, value: T) -> &mut T {
        if let Err(e) = self.check_room(1) {
            violated(e);
        }
        unsafe { self.push_unchecked(value) }
    }

    /// Appends the value returned by `construct`. Panics before calling it if the builder is full.
    ///
    /// If `construct` panics, nothing is added and the builder stays usable.
    #[track_caller]
    pub fn add_with(&mut self, construct: impl FnOnce() -> T) -> &mut T {
        if let Err(e) = self.check_room(1) {
            violated(e);
        }
        let value = construct();
        unsafe { self.push_unchecked(value) }
    }

    /// Appends the value returned by a fallible constructor.
    ///
    /// Capacity is checked before `construct` runs. On any error nothing is added.
    pub fn try_add_with<E>(&mut self, construct: impl FnOnce() -> Result<T, E>) -> Result<&mut T, E>
        where E: From<ArrayError>
    {
        self.check_room(1)?;
        let value = construct()?;
        Ok(unsafe { self.push_unchecked(value) })
    }

    /// Appends every item, one at a time.
    ///
    /// Items appended before a panic (from the iterator, or from running out of capacity)
    /// stay in the builder.
    #[track_caller]
    pub fn add_all<I: IntoIterator<Item=T>>(&mut self, items: I) {
        for item in items {
            self.add(item);
        }
    }

    /// Appends clones of `items`, one at a time.
    ///
    /// If a clone panics, the clones made before it stay in the builder and `len` counts
    /// exactly those. Panics without cloning anything if `items` does not fit.
    #[track_caller]
    pub fn add_all_cloned(&mut self, items: &[T]) where T: Clone {
        if let Err(e) = self.check_room(items.len()) {
            violated(e);
        }
        for item in items {
            unsafe { self.push_unchecked(item.clone()) };
        }
    }

    /// Appends copies of `items` with a single block copy.
    ///
    /// Copying `T` can not fail, so no per-element bookkeeping is needed.
    #[track_caller]
    pub fn add_all_copied(&mut self, items: &[T]) where T: Copy {
        if let Err(e) = self.check_room(items.len()) {
            violated(e);
        }
        unsafe {
            std::ptr::copy_nonoverlapping(items.as_ptr(), self.ptr.as_ptr().add(self.len), items.len());
        }
        self.len += items.len();
    }

    /// Removes the last constructed element and returns it.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            Some(unsafe { self.ptr.as_ptr().add(self.len).read() })
        }
    }

    /// Drops elements from the back until at most `len` remain.
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            self.len -= 1;
            unsafe { std::ptr::drop_in_place(self.ptr.as_ptr().add(self.len)) };
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0)
    }

    /// Converts the fully populated builder into an `Array`.
    ///
    /// Panics if fewer than `capacity` elements were constructed; use `finish_prefix` to
    /// finish early on purpose.
    #[track_caller]
    pub fn finish(self) -> Array<T> {
        if !self.is_full() {
            violated(ArrayError::NotFullyPopulated { len: self.len, capacity: self.capacity });
        }
        self.finish_prefix()
    }

    /// Converts the constructed prefix into an `Array`. The unused tail is released with it.
    pub fn finish_prefix(mut self) -> Array<T> {
        let len = std::mem::take(&mut self.len);
        let disposal = std::mem::replace(&mut self.disposal, Disposal::Null);
        trace!("finish builder with {} of {} elements", len, self.capacity);
        Array::from_parts(self.ptr, len, disposal)
    }
}

impl<T> Drop for ArrayBuilder<T> {
    fn drop(&mut self) {
        let len = std::mem::take(&mut self.len);
        let disposal = std::mem::replace(&mut self.disposal, Disposal::Null);
        propagate(unsafe { disposal.dispose(self.ptr.cast(), std::mem::size_of::<T>(), len, destroy_fn::<T>()) });
    }
}

impl<T> Debug for ArrayBuilder<T> where T: Debug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
