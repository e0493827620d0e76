//! This module is for testing only

use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type DropFlag<T> = Arc<Mutex<T>>;

struct CensusData {
    live: AtomicIsize,
    copies: AtomicIsize,
    panic_at: Mutex<Vec<isize>>,
    dropped: Mutex<Vec<isize>>,
}

/// Live instance accounting shared by a family of `Counted` values.
///
/// Each `Counted` takes the current live count as its index, so with reverse destruction
/// an element's index equals the live count right after it is dropped.
#[derive(Clone)]
pub struct Census {
    data: Arc<CensusData>,
}

impl Census {
    pub fn new() -> Census {
        Census {
            data: Arc::new(CensusData {
                live: AtomicIsize::new(0),
                copies: AtomicIsize::new(0),
                panic_at: Mutex::new(Vec::new()),
                dropped: Mutex::new(Vec::new()),
            })
        }
    }

    pub fn live(&self) -> isize {
        self.data.live.load(Ordering::SeqCst)
    }

    pub fn copies(&self) -> isize {
        self.data.copies.load(Ordering::SeqCst)
    }

    /// Indexes of originals in the order they were dropped.
    pub fn dropped(&self) -> Vec<isize> {
        self.data.dropped.lock().unwrap().clone()
    }

    /// Makes construction, copy and destruction of the element with `index` panic.
    pub fn panic_at(&self, index: isize) {
        *self.data.panic_at.lock().unwrap() = vec![index];
    }

    pub fn also_panic_at(&self, index: isize) {
        self.data.panic_at.lock().unwrap().push(index);
    }

    pub fn disarm(&self) {
        self.data.panic_at.lock().unwrap().clear();
    }

    fn fails_at(&self, index: isize) -> bool {
        index >= 0 && self.data.panic_at.lock().unwrap().contains(&index)
    }

    pub fn spawn(&self) -> Counted {
        let index = self.live();
        if self.fails_at(index) {
            panic!("construction of {} failed", index);
        }
        self.data.live.fetch_add(1, Ordering::SeqCst);
        Counted { index, census: self.clone() }
    }
}

/// Counts itself in a `Census` while alive. Copies have index `-1` and are counted apart.
pub struct Counted {
    pub index: isize,
    census: Census,
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        if self.census.fails_at(self.index) {
            panic!("copy of {} failed", self.index);
        }
        self.census.data.copies.fetch_add(1, Ordering::SeqCst);
        Counted { index: -1, census: self.census.clone() }
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        if self.index == -1 {
            self.census.data.copies.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        self.census.data.live.fetch_sub(1, Ordering::SeqCst);
        self.census.data.dropped.lock().unwrap().push(self.index);
        if self.census.fails_at(self.index) {
            panic!("destruction of {} failed", self.index);
        }
    }
}

/// Stores the next value of a shared counter into its own slot when dropped.
pub struct OrderRecorder {
    counter: Arc<AtomicUsize>,
    record_to: Arc<AtomicUsize>,
}

impl OrderRecorder {
    pub fn new(counter: &Arc<AtomicUsize>) -> (OrderRecorder, Arc<AtomicUsize>) {
        let record_to = Arc::new(AtomicUsize::new(0));
        (OrderRecorder { counter: counter.clone(), record_to: record_to.clone() }, record_to)
    }
}

impl Drop for OrderRecorder {
    fn drop(&mut self) {
        let position = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.record_to.store(position, Ordering::SeqCst);
    }
}

#[test]
fn census() {
    let census = Census::new();
    let a = census.spawn();
    let b = census.spawn();
    let c = b.clone();
    assert_eq!(2, census.live());
    assert_eq!(1, census.copies());
    std::mem::drop(c);
    std::mem::drop(b);
    std::mem::drop(a);
    assert_eq!(0, census.live());
    assert_eq!(0, census.copies());
    assert_eq!(vec![1, 0], census.dropped());
}

#[test]
fn order_recorder() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (first, first_slot) = OrderRecorder::new(&counter);
    let (second, second_slot) = OrderRecorder::new(&counter);
    std::mem::drop(second);
    std::mem::drop(first);
    assert_eq!(2, first_slot.load(Ordering::SeqCst));
    assert_eq!(1, second_slot.load(Ordering::SeqCst));
}
