//! Bit mask tables shared by rasterization backends.

use crate::occupancy::{Bitfield, BITS_PER_BITFIELD};

/// The bits of slab `slab` lying strictly below the Z depth `depth`.
///
/// XOR-ing `depth_mask(d, s)` into slab `s` of a column for every surface
/// crossing at depth `d` leaves exactly the bits between an odd number of
/// crossings set: the interior of a closed surface.
#[inline]
pub fn depth_mask(depth: u32, slab: u32) -> Bitfield {
    let lo = slab * BITS_PER_BITFIELD;

    if depth < lo {
        0
    } else if depth >= lo + BITS_PER_BITFIELD {
        Bitfield::MAX
    } else {
        !(Bitfield::MAX << (depth - lo))
    }
}

/// The bits of slab `slab` at or above the Z depth `depth`.
#[inline]
fn bits_at_or_above(depth: u32, slab: u32) -> Bitfield {
    !depth_mask(depth, slab)
}

/// The bits of slab `slab` covering the super-samples of native Z voxel `native_z`.
///
/// At magnification `m`, native voxel `z` spans the super-sampled Z range
/// `[z * m, (z + 1) * m)`.
#[inline]
pub fn z_region_mask(native_z: u32, slab: u32, magnification: u32) -> Bitfield {
    let start = native_z.saturating_mul(magnification);
    let end = start.saturating_add(magnification);
    bits_at_or_above(start, slab) ^ bits_at_or_above(end, slab)
}

/// Table of [`depth_mask`] for every depth in `0..=32 * max_z_slabs`.
///
/// Entries are stored depth-major: the `max_z_slabs` masks of one depth are
/// contiguous.
#[derive(Clone, Debug)]
pub struct DepthMaskLut {
    max_z_slabs: u32,
    data: Vec<Bitfield>,
}

impl DepthMaskLut {
    /// Builds the table for slicemaps of up to `max_z_slabs` slabs.
    pub fn new(max_z_slabs: u32) -> Self {
        let max_depth = BITS_PER_BITFIELD * max_z_slabs + 1;
        let data = (0..max_depth)
            .flat_map(|depth| (0..max_z_slabs).map(move |slab| depth_mask(depth, slab)))
            .collect();

        Self { max_z_slabs, data }
    }

    /// The number of distinct depths in the table.
    #[inline]
    pub fn max_depth(&self) -> u32 {
        BITS_PER_BITFIELD * self.max_z_slabs + 1
    }

    /// The number of slabs of each row.
    #[inline]
    pub fn max_z_slabs(&self) -> u32 {
        self.max_z_slabs
    }

    /// The mask for `depth` in slab `slab`.
    #[inline]
    pub fn get(&self, depth: u32, slab: u32) -> Bitfield {
        self.data[(depth * self.max_z_slabs + slab) as usize]
    }

    /// The raw table.
    #[inline]
    pub fn data(&self) -> &[Bitfield] {
        &self.data
    }
}

/// Table of [`z_region_mask`] for every native Z voxel of a `max_z_slabs`-slab slicemap.
///
/// Entries are stored native-Z-major: the `max_z_slabs` masks of one native
/// voxel are contiguous.
#[derive(Clone, Debug)]
pub struct ZRegionMaskLut {
    magnification: u32,
    max_z_slabs: u32,
    max_native_z: u32,
    data: Vec<Bitfield>,
}

impl ZRegionMaskLut {
    /// Builds the table for the given magnification.
    ///
    /// # Panics
    ///
    /// Panics if `magnification` is zero.
    pub fn new(magnification: u32, max_z_slabs: u32) -> Self {
        assert!(magnification > 0, "the magnification must be positive");
        let max_native_z = (BITS_PER_BITFIELD * max_z_slabs).div_ceil(magnification);
        let data = (0..max_native_z)
            .flat_map(|z| (0..max_z_slabs).map(move |s| z_region_mask(z, s, magnification)))
            .collect();

        Self {
            magnification,
            max_z_slabs,
            max_native_z,
            data,
        }
    }

    /// The magnification this table was built for.
    #[inline]
    pub fn magnification(&self) -> u32 {
        self.magnification
    }

    /// The number of slabs covered by the table.
    #[inline]
    pub fn max_z_slabs(&self) -> u32 {
        self.max_z_slabs
    }

    /// The number of native Z voxels covered by the table.
    #[inline]
    pub fn max_native_z(&self) -> u32 {
        self.max_native_z
    }

    /// The mask of native Z voxel `native_z` in slab `slab`.
    #[inline]
    pub fn get(&self, native_z: u32, slab: u32) -> Bitfield {
        self.data[(native_z * self.max_z_slabs + slab) as usize]
    }

    /// The raw table.
    #[inline]
    pub fn data(&self) -> &[Bitfield] {
        &self.data
    }
}
