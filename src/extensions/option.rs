use crate::layout::SENTINEL;

pub trait OptionExt<T> {
    fn when<F>(cond: bool, fa: F) -> Option<T>
    where
        F: FnOnce() -> T;
}

impl<T> OptionExt<T> for Option<T> {
    fn when<F>(cond: bool, fa: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        if cond {
            Some(fa())
        } else {
            None
        }
    }
}

/// Turns the layout tables' sentinel convention into an `Option`.
pub trait SentinelExt: Sized {
    fn wired(self) -> Option<Self>;
}

impl SentinelExt for u8 {
    fn wired(self) -> Option<u8> {
        Option::when(self != SENTINEL, || self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wired() {
        assert_eq!(11u8.wired(), Some(11));
        assert_eq!(SENTINEL.wired(), None);
    }
}
