use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;

use crate::disposer::{destroy_elements, DestroyFn, Panic};

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

/// Allocates uninitialized storage for `capacity` elements of `T` from the global allocator.
///
/// Returns a dangling pointer when nothing needs to be allocated.
pub(crate) fn allocate<T>(capacity: usize) -> NonNull<T> {
    let layout = match Layout::array::<T>(capacity) {
        Ok(layout) => layout,
        Err(_) => capacity_overflow(),
    };
    if layout.size() == 0 {
        return NonNull::dangling();
    }

    let ptr = unsafe { alloc(layout) } as *mut T;
    match NonNull::new(ptr) {
        Some(ptr) => {
            trace!("alloc {} bytes for {} elements at {:?}", layout.size(), capacity, ptr);
            ptr
        },
        None => handle_alloc_error(layout),
    }
}

/// Releases blocks obtained from `allocate` or from a boxed slice.
///
/// Keeps the allocated capacity, so a block may be released with fewer live elements
/// than it was allocated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HeapDisposer {
    capacity: usize,
    align: usize,
}

impl HeapDisposer {
    #[inline(always)]
    pub fn new<T>(capacity: usize) -> HeapDisposer {
        HeapDisposer {
            capacity,
            align: std::mem::align_of::<T>(),
        }
    }

    pub unsafe fn dispose(self, first: NonNull<u8>, element_size: usize, count: usize, destroy: Option<DestroyFn>) -> Result<(), Panic> {
        debug_assert!(count <= self.capacity, "heap block holds more elements than its capacity");
        let result = destroy_elements(first, element_size, count, destroy);

        let size = element_size * self.capacity;
        if size != 0 {
            trace!("dealloc {} bytes at {:?}", size, first);
            dealloc(first.as_ptr(), Layout::from_size_align_unchecked(size, self.align));
        }
        result
    }
}
