use super::allocation_error::{checked_volume, AllocationError};
use super::Occmap;
use crate::math::{Point, Vector};
use crate::utils::write_raw_words;
use std::io;
use std::path::Path;

/// A voxel where more components claimed a slot than the occmap has slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotOverflow {
    /// The voxel coordinates.
    pub voxel: Point<u32>,
    /// The number of components that claimed a slot.
    pub count: u32,
    /// The ids actually stored in the slots of this voxel.
    pub ids: Vec<u32>,
}

/// Per-voxel count of how many components claimed a slot of an [`Occmap`].
///
/// Counts are laid out with X varying fastest, then Y, then Z. A count larger
/// than the number of slots means some overlaps were dropped.
#[derive(Clone, Debug, Default)]
pub struct SlotCounts {
    counts: Vec<u32>,
    dims: Vector<u32>,
}

impl SlotCounts {
    /// Resizes to `dims` voxels and zeroes every count.
    ///
    /// On failure the counts are left empty and own no memory.
    pub fn reset(&mut self, dims: Vector<u32>) -> Result<(), AllocationError> {
        let request = [dims.x, dims.y, dims.z, 1];
        let Some(len) = checked_volume(request) else {
            *self = Self::default();
            return Err(AllocationError::SizeOverflow {
                map: "slot count array",
                dims: request,
            });
        };

        self.counts.clear();
        if let Err(source) = self.counts.try_reserve_exact(len) {
            *self = Self::default();
            return Err(AllocationError::OutOfMemory {
                map: "slot count array",
                dims: request,
                words: len,
                source,
            });
        }

        self.counts.resize(len, 0);
        self.dims = dims;
        Ok(())
    }

    /// The extents of the counted volume.
    #[inline]
    pub fn dims(&self) -> Vector<u32> {
        self.dims
    }

    /// The raw counts.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.counts
    }

    #[inline]
    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let (xs, ys) = (self.dims.x as usize, self.dims.y as usize);
        x as usize + xs * (y as usize + ys * z as usize)
    }

    /// The count of voxel `(x, y, z)`.
    #[inline]
    pub fn at(&self, x: u32, y: u32, z: u32) -> u32 {
        self.counts[self.index(x, y, z)]
    }

    /// The count of voxel `(x, y, z)`, mutably.
    #[inline]
    pub fn at_mut(&mut self, x: u32, y: u32, z: u32) -> &mut u32 {
        let i = self.index(x, y, z);
        &mut self.counts[i]
    }

    /// Zeroes the counts of the box at `corner` with extents `num_voxels`, clamped to the volume.
    pub fn clear_region(&mut self, corner: &Point<u32>, num_voxels: &Vector<u32>) {
        if corner.iter().zip(self.dims.iter()).any(|(c, d)| c >= d) {
            return;
        }

        let vx = num_voxels.inf(&(self.dims - corner.coords));
        let row = vx.x as usize;

        for z in corner.z..corner.z + vx.z {
            for y in corner.y..corner.y + vx.y {
                let start = self.index(corner.x, y, z);
                self.counts[start..start + row].fill(0);
            }
        }
    }

    /// Every voxel whose count exceeds the number of slots of `occmap`.
    ///
    /// Each overflow is also logged as a warning.
    pub fn check(&self, occmap: &Occmap) -> Vec<SlotOverflow> {
        let num_slots = occmap.num_slots();
        let k = occmap.num_alpha_bits();
        let mut result = Vec::new();

        for z in 0..self.dims.z {
            for y in 0..self.dims.y {
                for x in 0..self.dims.x {
                    let count = self.at(x, y, z);
                    if count <= num_slots {
                        continue;
                    }

                    let ids = (0..num_slots).map(|c| occmap.at(x, y, z, c).id(k)).collect();
                    let overflow = SlotOverflow {
                        voxel: Point::new(x, y, z),
                        count,
                        ids,
                    };
                    log::warn!(
                        "voxel ({}, {}, {}) is covered by {} components but only has {} slots (stored ids: {:?})",
                        x,
                        y,
                        z,
                        count,
                        num_slots,
                        overflow.ids
                    );
                    result.push(overflow);
                }
            }
        }

        result
    }

    /// Writes the raw counts to the file at `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> io::Result<()> {
        write_raw_words(path, &self.counts)
    }
}
