/*!

Type-erased disposal of element blocks.

An owning `Array` never knows where its storage came from. It carries a `Disposal` next to
its pointer and length, and hands both back to it exactly once. The disposal is given only
the first element's address, the element size, the live element count and an optional
per-element destroy function, so a single strategy value can release blocks of any type.

Every strategy destroys ALL live elements, even if some of them panic while dropping.
The first panic is held back until the whole block has been released, and is then resumed.
Any further panics from the same block are discarded.

*/

use std::any::Any;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::ptr::NonNull;

use crate::attach::Attached;
use crate::heap::HeapDisposer;

/// Payload of a panic captured while destroying elements.
pub type Panic = Box<dyn Any + Send + 'static>;

/// Drops a single element in place, given its address.
pub type DestroyFn = unsafe fn(*mut u8);

#[inline(always)]
unsafe fn destroy<T>(element: *mut u8) {
    std::ptr::drop_in_place(element as *mut T);
}

/// Returns the destroy function for `T`, or `None` if dropping `T` does nothing.
#[inline(always)]
pub fn destroy_fn<T>() -> Option<DestroyFn> {
    if std::mem::needs_drop::<T>() {
        Some(destroy::<T>)
    } else {
        None
    }
}

/// Strategy that releases a block of elements owned by an `Array`.
///
/// Implement this to back arrays with storage that did not come from the global allocator,
/// such as arenas, pools, or memory mapped regions. Closures with the same signature as
/// `dispose` implement it too.
pub trait ArrayDisposer: Send {
    /// Destroys `count` live elements starting at `first` and releases their storage.
    ///
    /// # Safety
    ///
    /// Called at most once per owned block. `first` points at `count` initialized elements
    /// of `element_size` bytes each, and `destroy`, when present, is the drop function of
    /// that element type. The elements must not be used after this call.
    unsafe fn dispose(self: Box<Self>, first: NonNull<u8>, element_size: usize, count: usize, destroy: Option<DestroyFn>);
}

impl<F> ArrayDisposer for F
    where F: FnOnce(NonNull<u8>, usize, usize, Option<DestroyFn>) + Send
{
    unsafe fn dispose(self: Box<Self>, first: NonNull<u8>, element_size: usize, count: usize, destroy: Option<DestroyFn>) {
        self(first, element_size, count, destroy)
    }
}

/// Destroys `count` elements in reverse order, continuing past panicking destructors.
///
/// Returns the first captured panic after every element was given a chance to drop.
///
/// # Safety
///
/// `first` must point at `count` initialized elements of `element_size` bytes that are not
/// used afterwards, and `destroy` must be the drop function of their type.
pub unsafe fn destroy_elements(first: NonNull<u8>, element_size: usize, count: usize, destroy: Option<DestroyFn>) -> Result<(), Panic> {
    let destroy = match destroy {
        Some(destroy) => destroy,
        None => return Ok(()),
    };

    let mut failure = DeferredPanic::new();
    for index in (0..count).rev() {
        let element = first.as_ptr().add(index * element_size);
        failure.capture(|| destroy(element));
    }
    failure.finish()
}

/// Holds the first panic out of a series of cleanup steps.
pub(crate) struct DeferredPanic {
    first: Option<Panic>,
}

impl DeferredPanic {
    #[inline(always)]
    pub fn new() -> DeferredPanic {
        DeferredPanic { first: None }
    }

    /// Runs one cleanup step, catching its panic.
    pub fn capture(&mut self, step: impl FnOnce()) {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(step)) {
            self.merge(Err(panic));
        }
    }

    pub fn merge(&mut self, result: Result<(), Panic>) {
        if let Err(panic) = result {
            if self.first.is_none() {
                self.first = Some(panic);
            } else {
                debug!("discarding secondary panic raised during disposal");
            }
        }
    }

    pub fn finish(self) -> Result<(), Panic> {
        match self.first {
            Some(panic) => Err(panic),
            None => Ok(()),
        }
    }
}

/// Resumes a panic captured during disposal.
///
/// While the thread is already unwinding the panic is discarded, a second one would abort.
#[inline(always)]
pub(crate) fn propagate(result: Result<(), Panic>) {
    if let Err(panic) = result {
        if std::thread::panicking() {
            warn!("discarding panic raised while disposing array elements during unwinding");
            return;
        }
        warn!("resuming panic raised while disposing array elements");
        resume_unwind(panic);
    }
}

/// The disposal strategy carried by every owning handle.
pub(crate) enum Disposal {
    /// Releases nothing: null arrays, static storage and promoted views.
    Null,
    /// Storage obtained from the global allocator.
    Heap(HeapDisposer),
    /// Another disposal followed by a list of attached owned values.
    Attached(Box<Attached>),
    /// User supplied strategy.
    Custom(Box<dyn ArrayDisposer>),
}

impl Disposal {
    #[inline(always)]
    pub fn is_null(&self) -> bool {
        matches!(self, Disposal::Null)
    }

    /// Destroys the block and releases it according to the strategy.
    ///
    /// # Safety
    ///
    /// Same contract as `ArrayDisposer::dispose`.
    pub unsafe fn dispose(self, first: NonNull<u8>, element_size: usize, count: usize, destroy: Option<DestroyFn>) -> Result<(), Panic> {
        match self {
            Disposal::Null => Ok(()),
            Disposal::Heap(heap) => heap.dispose(first, element_size, count, destroy),
            Disposal::Attached(attached) => attached.dispose(first, element_size, count, destroy),
            Disposal::Custom(custom) => {
                trace!("custom disposal of {} elements at {:?}", count, first);
                catch_unwind(AssertUnwindSafe(|| custom.dispose(first, element_size, count, destroy)))
            },
        }
    }
}
