use crate::{Array, ArrayBuilder};

/// Implements collect to heap allocated `Array`s of exactly the iterator's length.
pub trait ArrayIterator: Iterator {
    fn collect_array(self) -> Array<Self::Item> where Self: ExactSizeIterator;

    fn try_collect_array<I, E>(self) -> Result<Array<I>, E>
        where
            Self: Iterator<Item=Result<I, E>> + ExactSizeIterator;
}

impl<Q: Iterator> ArrayIterator for Q {
    fn collect_array(self) -> Array<Self::Item> where Q: ExactSizeIterator {
        let mut builder = ArrayBuilder::with_capacity(self.len());
        builder.add_all(self);
        builder.finish()
    }

    fn try_collect_array<I, E>(self) -> Result<Array<I>, E>
        where
            Self: Iterator<Item=Result<I, E>> + ExactSizeIterator
    {
        let mut builder = ArrayBuilder::with_capacity(self.len());
        for item in self {
            builder.add(item?);
        }
        Ok(builder.finish())
    }
}

/// Creates an `Array` holding the given elements, like `vec!`.
#[macro_export]
macro_rules! array {
    () => (
        $crate::Array::new()
    );
    ($($item:expr),+ $(,)?) => (
        $crate::Array::from_exact_iter(::core::iter::IntoIterator::into_iter([$($item),+]))
    );
}

#[cfg(test)]
mod traits_tests {
    use crate::{Array, ArrayIterator};
    use crate::dropflag::Census;

    #[test]
    fn test_collect() {
        let items = (0..12)
            .map(|v| v as i16)
            .collect_array()
            .iter()
            .map(|i: &i16| *i * 2)
            .collect_array();

        assert_eq!(12, items.len());
        for (i, (item, expected)) in items.iter().zip((0..12).map(|v| v as i16 * 2)).enumerate() {
            assert_eq!(*item, expected, "at index {}", i);
        }
    }

    #[test]
    fn test_try_collect() {
        let parsed: Result<Array<u8>, std::num::ParseIntError> = ["1", "2", "3"].iter().map(|s| s.parse::<u8>()).try_collect_array();
        assert_eq!(parsed.unwrap(), [1, 2, 3]);

        let census = Census::new();
        let failed: Result<Array<_>, String> = (0..5)
            .map(|i| if i < 3 { Ok(census.spawn()) } else { Err(format!("bad {}", i)) })
            .try_collect_array();
        assert_eq!(Some("bad 3".to_string()), failed.err());
        assert_eq!(0, census.live());
    }

    #[test]
    fn array_macro() {
        let empty: Array<u8> = crate::array![];
        assert!(empty.is_null());

        let items = crate::array![1, 2, 3,];
        assert_eq!(items, [1, 2, 3]);
    }
}
