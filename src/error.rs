use std::fmt::Display;

/// Constraint violations reported by arrays, views and builders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// An element was added to a builder that already holds `capacity` elements.
    CapacityExceeded { capacity: usize },
    /// A slice range was reversed or reached past the end of the sequence.
    SliceOutOfRange { start: usize, end: usize, len: usize },
    /// `finish` was called before every slot of the builder was constructed.
    NotFullyPopulated { len: usize, capacity: usize },
}

impl Display for ArrayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayError::CapacityExceeded { capacity } => write!(f, "Array builder is full, capacity is {}", capacity),
            ArrayError::SliceOutOfRange { start, end, len } => write!(f, "Slice {}..{} is out of range for length {}", start, end, len),
            ArrayError::NotFullyPopulated { len, capacity } => write!(f, "Array builder finished prematurely, {} of {} elements constructed", len, capacity),
        }
    }
}

impl std::error::Error for ArrayError {}

/// Validates `start..end` against a sequence of `len` elements.
#[inline(always)]
pub(crate) fn check_range(start: usize, end: usize, len: usize) -> Result<(), ArrayError> {
    if start <= end && end <= len {
        Ok(())
    } else {
        Err(ArrayError::SliceOutOfRange { start, end, len })
    }
}

/// Panics with the error's message, pointing at the caller of the checked operation.
#[cold]
#[track_caller]
pub(crate) fn violated(error: ArrayError) -> ! {
    panic!("{}", error)
}
