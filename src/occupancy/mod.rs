//! Bit-packed volumetric occupancy maps.
//!
//! A [`Slicemap`] stores, for a small region and a handful of components, one
//! occupancy bit per voxel packed along Z into 32-bit words. An [`Occmap`]
//! stores, for the whole volume, up to `C` [`Overlap`] records per voxel, each
//! one packing a component id with the fraction of the voxel it covers.

pub use self::allocation_error::AllocationError;
pub(crate) use self::allocation_error::checked_volume;
pub use self::occmap::Occmap;
pub use self::overlap::{max_component_id, num_alpha_bits, Overlap};
pub use self::slicemap::{Bitfield, Slicemap, BITS_PER_BITFIELD};
pub use self::slot_counts::{SlotCounts, SlotOverflow};

mod allocation_error;
mod occmap;
mod overlap;
mod slicemap;
mod slot_counts;

/// Characters used by the ASCII dumps, from empty to full.
pub(crate) const GRADIENT: &[u8] = b" .:;~=xX&@$";

/// Resizes `data` so it holds at least `len` zeroed words.
///
/// The storage only ever grows. Returns `Ok(true)` if a new buffer was
/// allocated. On failure `data` is left empty with no capacity.
pub(crate) fn grow_zeroed<T: Copy + Default>(
    data: &mut Vec<T>,
    len: usize,
) -> Result<bool, std::collections::TryReserveError> {
    if len <= data.len() {
        return Ok(false);
    }

    *data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, T::default());
    Ok(true)
}
