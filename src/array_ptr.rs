use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::error::{check_range, violated, ArrayError};

/// Borrowed, read-only window over contiguous elements owned elsewhere.
///
/// `ArrayPtr` never releases anything. It is `Copy`, and the lifetime ties it to whatever
/// owns the storage.
pub struct ArrayPtr<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    _marker: PhantomData<&'a [T]>,
}

impl<T> Clone for ArrayPtr<'_, T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArrayPtr<'_, T> {}

unsafe impl<T: Sync> Send for ArrayPtr<'_, T> {}
unsafe impl<T: Sync> Sync for ArrayPtr<'_, T> {}

impl<'a, T> ArrayPtr<'a, T> {
    #[inline(always)]
    pub const fn empty() -> ArrayPtr<'a, T> {
        ArrayPtr { ptr: NonNull::dangling(), len: 0, _marker: PhantomData }
    }

    #[inline(always)]
    pub fn from_slice(slice: &'a [T]) -> ArrayPtr<'a, T> {
        ArrayPtr { ptr: NonNull::from(slice).cast(), len: slice.len(), _marker: PhantomData }
    }

    /// Creates a view from a raw pointer and length. A null pointer is accepted for `len == 0`.
    ///
    /// # Safety
    ///
    /// `ptr` must point at `len` initialized elements that stay valid and unmutated for `'a`.
    #[inline(always)]
    pub unsafe fn from_raw_parts(ptr: *const T, len: usize) -> ArrayPtr<'a, T> {
        let ptr = match NonNull::new(ptr as *mut T) {
            Some(ptr) => ptr,
            None => {
                debug_assert_eq!(0, len, "null ArrayPtr must be empty");
                NonNull::dangling()
            },
        };
        ArrayPtr { ptr, len, _marker: PhantomData }
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
    pub fn as_slice(&self) -> &'a [T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// View of elements `start..end`, sharing the same storage.
    ///
    /// Panics if `start > end` or `end > len`.
    #[track_caller]
    pub fn slice(self, start: usize, end: usize) -> ArrayPtr<'a, T> {
        match self.try_slice(start, end) {
            Ok(slice) => slice,
            Err(e) => violated(e),
        }
    }

    /// View of elements `start..len`.
    #[track_caller]
    pub fn slice_from(self, start: usize) -> ArrayPtr<'a, T> {
        self.slice(start, self.len)
    }

    pub fn try_slice(self, start: usize, end: usize) -> Result<ArrayPtr<'a, T>, ArrayError> {
        check_range(start, end, self.len)?;
        Ok(ArrayPtr {
            ptr: unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(start)) },
            len: end - start,
            _marker: PhantomData,
        })
    }

    /// Converts this view to a foreign view type.
    #[inline(always)]
    pub fn adapt<V: FromArrayPtr<'a, T>>(self) -> V {
        V::from_array_ptr(self)
    }

    #[inline(always)]
    pub(crate) fn raw_ptr(&self) -> NonNull<T> {
        self.ptr
    }
}

impl<T> Default for ArrayPtr<'_, T> {
    fn default() -> Self {
        ArrayPtr::empty()
    }
}

impl<T> Deref for ArrayPtr<'_, T> {
    type Target = [T];

    #[inline(always)]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T> From<&'a [T]> for ArrayPtr<'a, T> {
    fn from(slice: &'a [T]) -> Self {
        ArrayPtr::from_slice(slice)
    }
}

impl<'a, T> From<&'a mut [T]> for ArrayPtr<'a, T> {
    fn from(slice: &'a mut [T]) -> Self {
        ArrayPtr::from_slice(slice)
    }
}

impl<'a, T, const N: usize> From<&'a [T; N]> for ArrayPtr<'a, T> {
    fn from(array: &'a [T; N]) -> Self {
        ArrayPtr::from_slice(array)
    }
}

impl<T> Debug for ArrayPtr<'_, T> where T: Debug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T, U> PartialEq<ArrayPtr<'_, U>> for ArrayPtr<'_, T> where T: PartialEq<U> {
    fn eq(&self, other: &ArrayPtr<'_, U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U> PartialEq<[U]> for ArrayPtr<'_, T> where T: PartialEq<U> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, const N: usize> PartialEq<[U; N]> for ArrayPtr<'_, T> where T: PartialEq<U> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<T: Eq> Eq for ArrayPtr<'_, T> {}

impl<T: Hash> Hash for ArrayPtr<'_, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

/// Borrowed, exclusive window over contiguous elements owned elsewhere.
pub struct ArrayPtrMut<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for ArrayPtrMut<'_, T> {}
unsafe impl<T: Sync> Sync for ArrayPtrMut<'_, T> {}

impl<'a, T> ArrayPtrMut<'a, T> {
    #[inline(always)]
    pub fn from_slice(slice: &'a mut [T]) -> ArrayPtrMut<'a, T> {
        let len = slice.len();
        ArrayPtrMut { ptr: NonNull::from(slice).cast(), len, _marker: PhantomData }
    }

    /// # Safety
    ///
    /// `ptr` must point at `len` initialized elements, valid and not otherwise accessed for `'a`.
    #[inline(always)]
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> ArrayPtrMut<'a, T> {
        let ptr = match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => {
                debug_assert_eq!(0, len, "null ArrayPtrMut must be empty");
                NonNull::dangling()
            },
        };
        ArrayPtrMut { ptr, len, _marker: PhantomData }
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

    /// Shortens the lifetime so the view can be used again afterwards.
    #[inline(always)]
    pub fn reborrow(&mut self) -> ArrayPtrMut<'_, T> {
        ArrayPtrMut { ptr: self.ptr, len: self.len, _marker: PhantomData }
    }

    #[inline(always)]
    pub fn as_array_ptr(&self) -> ArrayPtr<'_, T> {
        ArrayPtr { ptr: self.ptr, len: self.len, _marker: PhantomData }
    }

    #[inline(always)]
    pub fn into_array_ptr(self) -> ArrayPtr<'a, T> {
        ArrayPtr { ptr: self.ptr, len: self.len, _marker: PhantomData }
    }

    #[inline(always)]
    pub fn into_slice(self) -> &'a mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    #[track_caller]
    pub fn slice(self, start: usize, end: usize) -> ArrayPtrMut<'a, T> {
        match self.try_slice(start, end) {
            Ok(slice) => slice,
            Err(e) => violated(e),
        }
    }

    #[track_caller]
    pub fn slice_from(self, start: usize) -> ArrayPtrMut<'a, T> {
        let len = self.len;
        self.slice(start, len)
    }

    pub fn try_slice(self, start: usize, end: usize) -> Result<ArrayPtrMut<'a, T>, ArrayError> {
        check_range(start, end, self.len)?;
        Ok(ArrayPtrMut {
            ptr: unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(start)) },
            len: end - start,
            _marker: PhantomData,
        })
    }

    #[inline(always)]
    pub fn adapt<V: FromArrayPtrMut<'a, T>>(self) -> V {
        V::from_array_ptr_mut(self)
    }
}

impl<T> Deref for ArrayPtrMut<'_, T> {
    type Target = [T];

    #[inline(always)]
    fn deref(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> DerefMut for ArrayPtrMut<'_, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<'a, T> From<&'a mut [T]> for ArrayPtrMut<'a, T> {
    fn from(slice: &'a mut [T]) -> Self {
        ArrayPtrMut::from_slice(slice)
    }
}

impl<T> Debug for ArrayPtrMut<'_, T> where T: Debug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U> PartialEq<ArrayPtrMut<'_, U>> for ArrayPtrMut<'_, T> where T: PartialEq<U> {
    fn eq(&self, other: &ArrayPtrMut<'_, U>) -> bool {
        **self == **other
    }
}

/// Lets a foreign view type borrow from an `ArrayPtr` without this crate knowing about it.
///
/// The conversion must not allocate and must not take ownership of the elements.
pub trait FromArrayPtr<'a, T>: Sized {
    fn from_array_ptr(ptr: ArrayPtr<'a, T>) -> Self;
}

/// Mutable counterpart of `FromArrayPtr`.
pub trait FromArrayPtrMut<'a, T>: Sized {
    fn from_array_ptr_mut(ptr: ArrayPtrMut<'a, T>) -> Self;
}

impl<'a, T> FromArrayPtr<'a, T> for &'a [T] {
    #[inline(always)]
    fn from_array_ptr(ptr: ArrayPtr<'a, T>) -> Self {
        ptr.as_slice()
    }
}

impl<'a, T> FromArrayPtrMut<'a, T> for &'a mut [T] {
    #[inline(always)]
    fn from_array_ptr_mut(ptr: ArrayPtrMut<'a, T>) -> Self {
        ptr.into_slice()
    }
}
