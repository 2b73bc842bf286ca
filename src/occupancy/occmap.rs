use super::allocation_error::{checked_volume, AllocationError};
use super::overlap::{num_alpha_bits, Overlap};
use super::GRADIENT;
use crate::math::{Point, Vector};
use crate::utils::write_raw_words;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io;
use std::path::Path;

/// A dense `X × Y × Z × C` array of [`Overlap`] records.
///
/// Each voxel owns `C` slots, each holding a `(component id, alpha)` pair
/// where `alpha / denominator` is the fraction of the voxel covered by the
/// component. Records are laid out with X varying fastest, then Y, then Z,
/// then the slot.
///
/// The map never decides which slot a component goes into: its writers must
/// make sure distinct components don't land in the same slot of a voxel.
#[derive(Clone, Debug, Default)]
pub struct Occmap {
    // `data.len()` is the reserved size.
    data: Vec<Overlap>,
    size: usize,
    x: u32,
    y: u32,
    z: u32,
    num_slots: u32,
    denominator: u32,
    num_alpha_bits: u32,
}

impl Occmap {
    /// Creates an empty occmap that owns no memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cleared occmap with the given dimensions and denominator.
    pub fn with_size(
        x: u32,
        y: u32,
        z: u32,
        num_slots: u32,
        denominator: u32,
    ) -> Result<Self, AllocationError> {
        let mut result = Self::new();
        let _ = result.resize(x, y, z, num_slots)?;
        result.set_denominator(denominator);
        Ok(result)
    }

    /// Resizes this occmap to `x × y × z` voxels of `num_slots` slots each.
    ///
    /// Memory is only reallocated if the new size exceeds the reserved size;
    /// returns `Ok(true)` if a fresh (cleared) buffer was allocated. On failure
    /// the occmap is left empty and owns no memory.
    pub fn resize(
        &mut self,
        x: u32,
        y: u32,
        z: u32,
        num_slots: u32,
    ) -> Result<bool, AllocationError> {
        let dims = [x, y, z, num_slots];

        let Some(size) = checked_volume(dims) else {
            self.free();
            return Err(AllocationError::SizeOverflow {
                map: "occmap",
                dims,
            });
        };

        match super::grow_zeroed(&mut self.data, size) {
            Ok(new_allocation) => {
                if new_allocation {
                    log::debug!("occmap: allocated {} overlap records", size);
                }
                self.size = size;
                self.x = x;
                self.y = y;
                self.z = z;
                self.num_slots = num_slots;
                Ok(new_allocation)
            }
            Err(source) => {
                self.free();
                Err(AllocationError::OutOfMemory {
                    map: "occmap",
                    dims,
                    words: size,
                    source,
                })
            }
        }
    }

    /// Sets the denominator of alpha values and the matching packing width.
    pub fn set_denominator(&mut self, denominator: u32) {
        self.denominator = denominator;
        self.num_alpha_bits = num_alpha_bits(denominator);
    }

    /// Releases all memory and resets this occmap to zero size.
    pub fn free(&mut self) {
        let denominator = self.denominator;
        *self = Self::default();
        self.set_denominator(denominator);
    }

    /// Empties every slot of every voxel.
    pub fn clear(&mut self) {
        self.data[..self.size].fill(Overlap::EMPTY);
    }

    /// Empties every slot of the voxels in the box at `corner` with extents `num_voxels`.
    ///
    /// The box is clamped to the bounds of the map; nothing outside of it is
    /// touched.
    pub fn clear_region(&mut self, corner: &Point<u32>, num_voxels: &Vector<u32>) {
        let dims = self.dims();
        if corner.iter().zip(dims.iter()).any(|(c, d)| c >= d) {
            return;
        }

        let vx = num_voxels.inf(&(dims - corner.coords));
        let row = vx.x as usize;

        for c in 0..self.num_slots {
            for z in corner.z..corner.z + vx.z {
                for y in corner.y..corner.y + vx.y {
                    let start = self.index(corner.x, y, z, c);
                    self.data[start..start + row].fill(Overlap::EMPTY);
                }
            }
        }
    }

    /// The records of this occmap.
    #[inline]
    pub fn data(&self) -> &[Overlap] {
        &self.data[..self.size]
    }

    /// The records of this occmap, mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [Overlap] {
        &mut self.data[..self.size]
    }

    /// The number of records in use.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The X extent, in voxels.
    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    /// The Y extent, in voxels.
    #[inline]
    pub fn y(&self) -> u32 {
        self.y
    }

    /// The Z extent, in voxels.
    #[inline]
    pub fn z(&self) -> u32 {
        self.z
    }

    /// The extents of this occmap, in voxels.
    #[inline]
    pub fn dims(&self) -> Vector<u32> {
        Vector::new(self.x, self.y, self.z)
    }

    /// The number of slots of each voxel.
    #[inline]
    pub fn num_slots(&self) -> u32 {
        self.num_slots
    }

    /// The denominator of alpha values.
    #[inline]
    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// The number of low bits of each record holding the alpha value.
    #[inline]
    pub fn num_alpha_bits(&self) -> u32 {
        self.num_alpha_bits
    }

    #[inline]
    fn index(&self, x: u32, y: u32, z: u32, c: u32) -> usize {
        let (xs, ys, zs) = (self.x as usize, self.y as usize, self.z as usize);
        x as usize + xs * (y as usize + ys * (z as usize + zs * c as usize))
    }

    /// The record in slot `c` of voxel `(x, y, z)`.
    #[inline]
    pub fn at(&self, x: u32, y: u32, z: u32, c: u32) -> Overlap {
        self.data[self.index(x, y, z, c)]
    }

    /// The record in slot `c` of voxel `(x, y, z)`, mutably.
    #[inline]
    pub fn at_mut(&mut self, x: u32, y: u32, z: u32, c: u32) -> &mut Overlap {
        let i = self.index(x, y, z, c);
        &mut self.data[i]
    }

    /// The fraction of voxel `(x, y, z)` covered according to slot `c`.
    #[inline]
    pub fn fraction(&self, x: u32, y: u32, z: u32, c: u32) -> f32 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.at(x, y, z, c).alpha(self.num_alpha_bits) as f32 / self.denominator as f32
    }

    /// Writes the raw records of this occmap to the file at `path`.
    ///
    /// The file is the in-memory image of [`Self::data`]: one native-endian
    /// `u32` per record, X fastest, then Y, then Z, then slot, with no header.
    pub fn write(&self, path: impl AsRef<Path>) -> io::Result<()> {
        write_raw_words(path, self.data())
    }

    /// Renders the coverage of every component found in each slot as text.
    ///
    /// Each line shows one `(x, y)` column along Z, shading each voxel
    /// from `' '` (uncovered) to `'$'` (fully covered).
    pub fn to_ascii(&self) -> String {
        let k = self.num_alpha_bits;
        let mut out = String::new();

        for c in 0..self.num_slots {
            let mut ids = BTreeSet::new();
            for z in 0..self.z {
                for y in 0..self.y {
                    for x in 0..self.x {
                        let o = self.at(x, y, z, c);
                        if o.alpha(k) > 0 {
                            let _ = ids.insert(o.id(k));
                        }
                    }
                }
            }

            if ids.is_empty() {
                continue;
            }

            let _ = writeln!(out, "slot {}:", c);

            for id in ids {
                let _ = writeln!(out, "  component {}:", id);

                for y in 0..self.y {
                    for x in 0..self.x {
                        let covered = |z| {
                            let o = self.at(x, y, z, c);
                            o.alpha(k) > 0 && o.id(k) == id
                        };
                        if !(0..self.z).any(covered) {
                            continue;
                        }

                        let _ = write!(out, "    ({:3},{:3}) ", x, y);
                        for z in 0..self.z {
                            let o = self.at(x, y, z, c);
                            let alpha = if o.id(k) == id { o.alpha(k) } else { 0 };
                            out.push(self.shade(alpha));
                        }
                        out.push('\n');
                    }
                }
            }
        }

        out
    }

    fn shade(&self, alpha: u32) -> char {
        let steps = GRADIENT.len() as u32;
        let i = if alpha == 0 {
            0
        } else if alpha >= self.denominator || self.denominator <= 1 {
            steps - 1
        } else {
            1 + (alpha - 1) * (steps - 2) / (self.denominator - 1)
        };
        GRADIENT[i as usize] as char
    }
}
