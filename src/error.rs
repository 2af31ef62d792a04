use core::fmt;

/// Returned by [`ChainHashMap::at`](crate::ChainHashMap::at) when the key is
/// absent.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NotFound;

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no such key")
    }
}

impl std::error::Error for NotFound {}
