use std::ptr::NonNull;

use crate::{Array, ArrayPtr, ArrayPtrMut};
use crate::disposer::{DeferredPanic, DestroyFn, Disposal, Panic};

trait Held: Send {}

impl<T: Send> Held for T {}

/// A disposal extended with owned values that must live exactly as long as the array.
///
/// Attaching to an array that already carries attachments appends to the same list, so
/// chained `attach` calls release in one flat order: the elements first, then every
/// attachment in the order it was attached.
pub(crate) struct Attached {
    inner: Disposal,
    held: Vec<Box<dyn Held>>,
}

impl Attached {
    fn compose<A: Send + 'static>(disposal: Disposal, attachment: A) -> Disposal {
        let attachment: Box<dyn Held> = Box::new(attachment);
        match disposal {
            Disposal::Attached(mut attached) => {
                attached.held.push(attachment);
                trace!("attach: {} values held", attached.held.len());
                Disposal::Attached(attached)
            },
            inner => {
                trace!("attach: first value held");
                Disposal::Attached(Box::new(Attached { inner, held: vec![attachment] }))
            },
        }
    }

    pub unsafe fn dispose(self: Box<Self>, first: NonNull<u8>, element_size: usize, count: usize, destroy: Option<DestroyFn>) -> Result<(), Panic> {
        let Attached { inner, held } = *self;
        let mut failure = DeferredPanic::new();
        failure.merge(inner.dispose(first, element_size, count, destroy));
        for value in held {
            failure.capture(move || std::mem::drop(value));
        }
        failure.finish()
    }
}

impl<T> Array<T> {
    /// Returns an array over the same elements that also owns `attachment`.
    ///
    /// The element storage is not moved, so `as_ptr` is unchanged. When the returned array is
    /// released, the elements are destroyed first and then the attachment. Tuples are released
    /// field by field, so `attach((a, b))` releases `a` before `b`, exactly like
    /// `attach(a).attach(b)`.
    ///
    /// Attachments must be `Send + 'static` so the array stays `Send`. Thread-bound values
    /// such as `Rc` can not be attached; wrap shared state in `Arc` instead.
    pub fn attach<A: Send + 'static>(mut self, attachment: A) -> Array<T> {
        let (ptr, len, disposal) = self.take_parts();
        Array::from_parts(ptr, len, Attached::compose(disposal, attachment))
    }
}

impl<'a, T> ArrayPtr<'a, T> {
    /// Promotes this view to an owning array that releases only `attachment`.
    ///
    /// The viewed elements are never destroyed by the returned array, whoever owns them
    /// keeps that responsibility.
    ///
    /// # Safety
    ///
    /// The viewed storage must outlive the returned array and every array derived from it
    /// by further attaching. The elements must not be mutated through the returned array
    /// while any other reference to them exists.
    ///
    /// As with `Array::attach`, the attachment must be `Send + 'static`.
    pub unsafe fn attach<A: Send + 'static>(self, attachment: A) -> Array<T> {
        Array::from_parts(self.raw_ptr(), self.len(), Attached::compose(Disposal::Null, attachment))
    }
}

impl<'a, T> ArrayPtrMut<'a, T> {
    /// Promotes this exclusive view to an owning array that releases only `attachment`.
    ///
    /// # Safety
    ///
    /// Same contract as `ArrayPtr::attach`.
    pub unsafe fn attach<A: Send + 'static>(self, attachment: A) -> Array<T> {
        self.into_array_ptr().attach(attachment)
    }
}

#[cfg(test)]
mod attach_tests {
    use crate::{heap_array_builder, Array, ArrayPtrMut};
    use crate::dropflag::{Census, OrderRecorder};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn recorded_array(counter: &Arc<AtomicUsize>) -> (Array<Box<OrderRecorder>>, Arc<AtomicUsize>) {
        let (obj, slot) = OrderRecorder::new(counter);
        let mut builder = heap_array_builder(1);
        builder.add(Box::new(obj));
        (builder.finish(), slot)
    }

    #[test]
    fn attach() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (array, destroyed1) = recorded_array(&counter);
        let (obj2, destroyed2) = OrderRecorder::new(&counter);
        let (obj3, destroyed3) = OrderRecorder::new(&counter);
        let (obj4, destroyed4) = OrderRecorder::new(&counter);
        let ptr = array.as_ptr();

        let mut combined = array.attach((Box::new(obj2), Box::new(obj3), Box::new(obj4)));
        assert_eq!(ptr, combined.as_ptr());
        assert_eq!(1, combined.len());
        assert_eq!(0, destroyed1.load(Ordering::SeqCst));
        assert_eq!(0, destroyed2.load(Ordering::SeqCst));
        assert_eq!(0, destroyed3.load(Ordering::SeqCst));

        combined.reset();

        assert_eq!(1, destroyed1.load(Ordering::SeqCst));
        assert_eq!(2, destroyed2.load(Ordering::SeqCst));
        assert_eq!(3, destroyed3.load(Ordering::SeqCst));
        assert_eq!(4, destroyed4.load(Ordering::SeqCst));
    }

    #[test]
    fn attach_nested() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (array, destroyed1) = recorded_array(&counter);
        let (obj2, destroyed2) = OrderRecorder::new(&counter);
        let (obj3, destroyed3) = OrderRecorder::new(&counter);
        let (obj4, destroyed4) = OrderRecorder::new(&counter);
        let ptr = array.as_ptr();

        let mut combined = array.attach(Box::new(obj2)).attach((Box::new(obj3), Box::new(obj4)));
        assert_eq!(ptr, combined.as_ptr());
        assert_eq!(1, combined.len());
        assert_eq!(0, destroyed1.load(Ordering::SeqCst));

        combined.reset();

        assert_eq!(1, destroyed1.load(Ordering::SeqCst));
        assert_eq!(2, destroyed2.load(Ordering::SeqCst));
        assert_eq!(3, destroyed3.load(Ordering::SeqCst));
        assert_eq!(4, destroyed4.load(Ordering::SeqCst));
    }

    #[test]
    fn attach_from_array_ptr() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (mut array, destroyed1) = recorded_array(&counter);
        let (obj2, destroyed2) = OrderRecorder::new(&counter);
        let (obj3, destroyed3) = OrderRecorder::new(&counter);
        let (obj4, destroyed4) = OrderRecorder::new(&counter);
        let ptr = array.as_ptr();

        let mut combined = unsafe { array.view().attach(Box::new(obj2)) }.attach(Box::new(obj3)).attach(Box::new(obj4));
        assert!(!array.is_null());
        assert_eq!(ptr, combined.as_ptr());
        assert_eq!(0, destroyed2.load(Ordering::SeqCst));

        combined.reset();

        assert_eq!(1, destroyed2.load(Ordering::SeqCst));
        assert_eq!(2, destroyed3.load(Ordering::SeqCst));
        assert_eq!(3, destroyed4.load(Ordering::SeqCst));
        assert_eq!(0, destroyed1.load(Ordering::SeqCst), "viewed element is still owned by the array");

        array.reset();

        assert_eq!(4, destroyed1.load(Ordering::SeqCst));
    }

    #[test]
    fn attach_from_mutable_view() {
        let census = Census::new();
        let mut items = [1, 2, 3];
        {
            let mut owner = unsafe { ArrayPtrMut::from_slice(&mut items).slice_from(1).attach(census.spawn()) };
            assert_eq!(owner, [2, 3]);
            owner[0] = 20;
            assert_eq!(1, census.live());
        }
        assert_eq!(0, census.live());
        assert_eq!([1, 20, 3], items);
    }

    #[test]
    fn attachment_outlives_elements_that_borrow_from_it() {
        let census = Census::new();
        let keep_alive = Arc::new(census.spawn());
        let array = Array::from_fn(3, |_| keep_alive.clone());
        let array = array.attach(keep_alive);
        assert_eq!(3, array.len());
        assert_eq!(1, census.live());
        std::mem::drop(array);
        assert_eq!(0, census.live());
    }

    #[test]
    fn panicking_attachment_does_not_stop_release() {
        let census = Census::new();
        let array = Array::from_fn(2, |_| census.spawn());
        let first = census.spawn();
        let second = census.spawn();
        census.panic_at(2);

        let array = array.attach(first).attach(second);
        let result = catch_unwind(AssertUnwindSafe(move || std::mem::drop(array)));
        assert!(result.is_err());
        assert_eq!(0, census.live());
        assert_eq!(vec![1, 0, 2, 3], census.dropped());
    }
}
