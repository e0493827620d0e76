use crate::Array;

/// Marks element types whose storage can be reused as `U` without any conversion.
///
/// # Safety
///
/// `Self` and `U` must have the same size and alignment, every valid `Self` must be a valid
/// `U`, and dropping a `U` in place must release whatever a `Self` would.
pub unsafe trait LayoutCompatible<U>: Sized {}

unsafe impl LayoutCompatible<u8> for i8 {}
unsafe impl LayoutCompatible<i8> for u8 {}

impl<T> Array<T> {
    /// Moves the storage into an array of `U`, leaving this array null.
    ///
    /// The elements are neither copied nor moved, and the disposal strategy goes with them.
    pub fn release_as<U>(&mut self) -> Array<U> where T: LayoutCompatible<U> {
        debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<U>());
        debug_assert_eq!(std::mem::align_of::<T>(), std::mem::align_of::<U>());
        let (ptr, len, disposal) = self.take_parts();
        Array::from_parts(ptr.cast::<U>(), len, disposal)
    }
}

impl Array<i8> {
    /// Reinterprets C `char` storage as bytes.
    #[inline(always)]
    pub fn release_as_bytes(&mut self) -> Array<u8> {
        self.release_as()
    }
}

impl Array<u8> {
    /// Reinterprets bytes as C `char` storage.
    #[inline(always)]
    pub fn release_as_chars(&mut self) -> Array<i8> {
        self.release_as()
    }
}
