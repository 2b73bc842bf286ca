use std::collections::TryReserveError;

/// Error returned when a map could not allocate its storage.
///
/// When this is returned the map has been reset to a zero-sized map that owns
/// no memory.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// The number of words implied by the requested dimensions does not fit in a `usize`.
    #[error("the {map} dimensions {dims:?} overflow the addressable size")]
    SizeOverflow {
        /// The kind of map being resized.
        map: &'static str,
        /// The requested dimensions.
        dims: [u32; 4],
    },
    /// The allocator failed to provide the requested number of words.
    #[error("failed to allocate a {map} of {words} words for dimensions {dims:?}: {source}")]
    OutOfMemory {
        /// The kind of map being resized.
        map: &'static str,
        /// The requested dimensions.
        dims: [u32; 4],
        /// The number of words requested.
        words: usize,
        /// The allocator error.
        source: TryReserveError,
    },
}

/// The product of `dims` as a `usize`, if it does not overflow.
pub(crate) fn checked_volume(dims: [u32; 4]) -> Option<usize> {
    dims.iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d as usize))
}
