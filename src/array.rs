use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::{ArrayBuilder, ArrayDisposer, ArrayError, ArrayIterator, ArrayPtr, ArrayPtrMut, FromArrayPtr, FromArrayPtrMut};
use crate::disposer::{destroy_fn, propagate, Disposal, Panic};
use crate::heap::HeapDisposer;

/// Owning handle of a fixed-length run of contiguous elements.
///
/// An `Array` holds a pointer, a length and the disposal strategy that releases them.
/// It can not be cloned: moving it moves the ownership, and the moved-from place (when taken
/// with `std::mem::take` or one of the `release_*` functions) becomes the null array.
///
/// Dropping the array destroys every element in reverse order and releases the storage.
/// If an element panics while dropping, the remaining elements are still destroyed and the
/// storage is still released before the panic continues.
pub struct Array<T> {
    ptr: NonNull<T>,
    len: usize,
    disposal: Disposal,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send> Send for Array<T> {}
unsafe impl<T: Sync> Sync for Array<T> {}

impl<T> Array<T> {
    /// The null array: no elements, no storage, nothing to release.
    #[inline(always)]
    pub const fn new() -> Array<T> {
        Array {
            ptr: NonNull::dangling(),
            len: 0,
            disposal: Disposal::Null,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub(crate) fn from_parts(ptr: NonNull<T>, len: usize, disposal: Disposal) -> Array<T> {
        Array { ptr, len, disposal, _marker: PhantomData }
    }

    /// Moves the contents out, leaving this array null.
    #[inline(always)]
    pub(crate) fn take_parts(&mut self) -> (NonNull<T>, usize, Disposal) {
        let ptr = std::mem::replace(&mut self.ptr, NonNull::dangling());
        let len = std::mem::take(&mut self.len);
        let disposal = std::mem::replace(&mut self.disposal, Disposal::Null);
        (ptr, len, disposal)
    }

    /// Takes ownership of `len` elements at `ptr`, released by `disposer` when dropped.
    ///
    /// # Safety
    ///
    /// `ptr` must point at `len` initialized elements that nothing else uses while the array
    /// is alive, and `disposer` must be able to release exactly that block.
    pub unsafe fn from_raw_parts(ptr: NonNull<T>, len: usize, disposer: Box<dyn ArrayDisposer>) -> Array<T> {
        Array::from_parts(ptr, len, Disposal::Custom(disposer))
    }

    /// Wraps storage that lives forever. Elements are never dropped.
    pub fn from_static(items: &'static mut [T]) -> Array<T> {
        let len = items.len();
        Array::from_parts(NonNull::from(items).cast(), len, Disposal::Null)
    }

    /// Constructs `len` elements with `f(index)`.
    ///
    /// If `f` panics, the elements constructed so far are dropped and the panic continues.
    pub fn from_fn(len: usize, mut f: impl FnMut(usize) -> T) -> Array<T> {
        let mut builder = ArrayBuilder::with_capacity(len);
        for index in 0..len {
            builder.add(f(index));
        }
        builder.finish()
    }

    /// Like `from_fn`, but stops at the first error, dropping the elements constructed so far.
    pub fn try_from_fn<E>(len: usize, mut f: impl FnMut(usize) -> Result<T, E>) -> Result<Array<T>, E> {
        let mut builder = ArrayBuilder::with_capacity(len);
        for index in 0..len {
            builder.add(f(index)?);
        }
        Ok(builder.finish())
    }

    /// Copies `items` into a new heap array.
    pub fn from_slice(items: &[T]) -> Array<T> where T: Clone {
        let mut builder = ArrayBuilder::with_capacity(items.len());
        builder.add_all_cloned(items);
        builder.finish()
    }

    /// Collects an iterator of known length without intermediate reallocation.
    #[track_caller]
    pub fn from_exact_iter<I>(items: I) -> Array<T> where I: IntoIterator<Item=T>, I::IntoIter: ExactSizeIterator {
        let items = items.into_iter();
        let mut builder = ArrayBuilder::with_capacity(items.len());
        builder.add_all(items);
        builder.finish()
    }

    /// Returns true for the null array.
    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.len == 0 && self.disposal.is_null()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn view(&self) -> ArrayPtr<'_, T> {
        ArrayPtr::from_slice(self.as_slice())
    }

    #[inline(always)]
    pub fn view_mut(&mut self) -> ArrayPtrMut<'_, T> {
        ArrayPtrMut::from_slice(self.as_mut_slice())
    }

    /// Borrowed view of elements `start..end`.
    ///
    /// Panics if `start > end` or `end > len`.
    #[track_caller]
    pub fn slice(&self, start: usize, end: usize) -> ArrayPtr<'_, T> {
        self.view().slice(start, end)
    }

    /// Borrowed view of elements `start..len`.
    #[track_caller]
    pub fn slice_from(&self, start: usize) -> ArrayPtr<'_, T> {
        self.view().slice_from(start)
    }

    #[track_caller]
    pub fn slice_mut(&mut self, start: usize, end: usize) -> ArrayPtrMut<'_, T> {
        self.view_mut().slice(start, end)
    }

    pub fn try_slice(&self, start: usize, end: usize) -> Result<ArrayPtr<'_, T>, ArrayError> {
        self.view().try_slice(start, end)
    }

    /// Releases the contents now and becomes the null array.
    ///
    /// A panic raised by an element's destructor is resumed after the whole block is released.
    pub fn reset(&mut self) {
        propagate(self.dispose());
    }

    /// Creates a new array holding `f` applied to every element.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Array<U> {
        self.iter().map(f).collect_array()
    }

    /// Converts a view of this array to a foreign view type.
    #[inline(always)]
    pub fn adapt<'a, V: FromArrayPtr<'a, T>>(&'a self) -> V {
        V::from_array_ptr(self.view())
    }

    #[inline(always)]
    pub fn adapt_mut<'a, V: FromArrayPtrMut<'a, T>>(&'a mut self) -> V {
        V::from_array_ptr_mut(self.view_mut())
    }

    fn dispose(&mut self) -> Result<(), Panic> {
        let (ptr, len, disposal) = self.take_parts();
        unsafe { disposal.dispose(ptr.cast(), std::mem::size_of::<T>(), len, destroy_fn::<T>()) }
    }
}

impl<T> Drop for Array<T> {
    fn drop(&mut self) {
        propagate(self.dispose());
    }
}

impl<T> Default for Array<T> {
    #[inline(always)]
    fn default() -> Self {
        Array::new()
    }
}

impl<T> Deref for Array<T> {
    type Target = [T];

    #[inline(always)]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Array<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for Array<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsMut<[T]> for Array<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> From<Box<[T]>> for Array<T> {
    fn from(items: Box<[T]>) -> Self {
        let len = items.len();
        let ptr = NonNull::from(Box::leak(items)).cast::<T>();
        Array::from_parts(ptr, len, Disposal::Heap(HeapDisposer::new::<T>(len)))
    }
}

impl<T> From<Vec<T>> for Array<T> {
    fn from(items: Vec<T>) -> Self {
        Array::from(items.into_boxed_slice())
    }
}

impl<T> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item=T>>(items: I) -> Self {
        Array::from(items.into_iter().collect::<Vec<T>>())
    }
}

impl<'a, T> IntoIterator for &'a Array<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Array<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T> Debug for Array<T> where T: Debug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T, U> PartialEq<Array<U>> for Array<T> where T: PartialEq<U> {
    fn eq(&self, other: &Array<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U> PartialEq<ArrayPtr<'_, U>> for Array<T> where T: PartialEq<U> {
    fn eq(&self, other: &ArrayPtr<'_, U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U> PartialEq<Array<U>> for ArrayPtr<'_, T> where T: PartialEq<U> {
    fn eq(&self, other: &Array<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U> PartialEq<[U]> for Array<T> where T: PartialEq<U> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, const N: usize> PartialEq<[U; N]> for Array<T> where T: PartialEq<U> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<T, U> PartialEq<Vec<U>> for Array<T> where T: PartialEq<U> {
    fn eq(&self, other: &Vec<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for Array<T> {}

impl<T: Hash> Hash for Array<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}
