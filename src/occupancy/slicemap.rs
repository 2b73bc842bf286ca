use super::allocation_error::{checked_volume, AllocationError};
use crate::lattice::ceil_divide;
use crate::utils::write_raw_words;
use std::fmt::Write as _;
use std::io;
use std::path::Path;

/// A word of packed Z occupancy bits.
pub type Bitfield = u32;

/// The number of Z voxels packed in one [`Bitfield`].
pub const BITS_PER_BITFIELD: u32 = Bitfield::BITS;

/// A dense `X × Y × Z × C` array of occupancy bits, packed along Z.
///
/// Bit `z % 32` of the word at `(x, y, z / 32, c)` tells whether voxel
/// `(x, y, z)` is inside component `c`. Words are laid out with X varying
/// fastest, then Y, then the Z slab, then the component.
///
/// The storage only ever grows: resizing to a smaller map reuses the existing
/// buffer, so a slicemap can be reused across many subvolumes without
/// reallocating.
#[derive(Clone, Debug, Default)]
pub struct Slicemap {
    // `data.len()` is the reserved size.
    data: Vec<Bitfield>,
    size: usize,
    x: u32,
    y: u32,
    num_z_slabs: u32,
    num_components: u32,
}

impl Slicemap {
    /// Creates an empty slicemap that owns no memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zeroed slicemap with the given dimensions.
    pub fn with_size(x: u32, y: u32, z: u32, c: u32) -> Result<Self, AllocationError> {
        let mut result = Self::new();
        let _ = result.resize(x, y, z, c)?;
        Ok(result)
    }

    /// Resizes this slicemap to `x × y × z × c` bits, with `z` rounded up to a multiple of 32.
    ///
    /// Memory is only reallocated if the new size exceeds the reserved size.
    /// Returns `Ok(true)` if a fresh (zeroed) buffer was allocated. Otherwise the
    /// previous contents are reinterpreted under the new dimensions and should
    /// be cleared by the caller.
    ///
    /// On failure the slicemap is left empty and owns no memory.
    pub fn resize(&mut self, x: u32, y: u32, z: u32, c: u32) -> Result<bool, AllocationError> {
        let num_z_slabs = ceil_divide(z, BITS_PER_BITFIELD);
        let dims = [x, y, z, c];

        let Some(size) = checked_volume([x, y, num_z_slabs, c]) else {
            self.free();
            return Err(AllocationError::SizeOverflow {
                map: "slicemap",
                dims,
            });
        };

        match super::grow_zeroed(&mut self.data, size) {
            Ok(new_allocation) => {
                if new_allocation {
                    log::debug!("slicemap: allocated {} bitfields", size);
                }
                self.size = size;
                self.x = x;
                self.y = y;
                self.num_z_slabs = num_z_slabs;
                self.num_components = c;
                Ok(new_allocation)
            }
            Err(source) => {
                self.free();
                Err(AllocationError::OutOfMemory {
                    map: "slicemap",
                    dims,
                    words: size,
                    source,
                })
            }
        }
    }

    /// Zeroes every bit of this slicemap.
    pub fn clear(&mut self) {
        self.data[..self.size].fill(0);
    }

    /// Releases all memory and resets this slicemap to zero size.
    pub fn free(&mut self) {
        *self = Self::default();
    }

    /// The words of this slicemap.
    #[inline]
    pub fn data(&self) -> &[Bitfield] {
        &self.data[..self.size]
    }

    /// The words of this slicemap, mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [Bitfield] {
        &mut self.data[..self.size]
    }

    /// The number of words in use.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The number of words this slicemap can hold without reallocating.
    #[inline]
    pub fn reserved_size(&self) -> usize {
        self.data.len()
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

    /// The number of 32-voxel Z slabs of each component.
    #[inline]
    pub fn num_z_slabs(&self) -> u32 {
        self.num_z_slabs
    }

    /// The number of components.
    #[inline]
    pub fn num_components(&self) -> u32 {
        self.num_components
    }

    #[inline]
    fn index(&self, x: u32, y: u32, s: u32, c: u32) -> usize {
        let (xs, ys, ss) = (self.x as usize, self.y as usize, self.num_z_slabs as usize);
        x as usize + xs * (y as usize + ys * (s as usize + ss * c as usize))
    }

    /// The word holding slab `s` of column `(x, y)` of component `c`.
    #[inline]
    pub fn at(&self, x: u32, y: u32, s: u32, c: u32) -> Bitfield {
        self.data[self.index(x, y, s, c)]
    }

    /// The word holding slab `s` of column `(x, y)` of component `c`, mutably.
    #[inline]
    pub fn at_mut(&mut self, x: u32, y: u32, s: u32, c: u32) -> &mut Bitfield {
        let i = self.index(x, y, s, c);
        &mut self.data[i]
    }

    /// Is voxel `(x, y, z)` occupied by component `c`?
    #[inline]
    pub fn occupied_at(&self, x: u32, y: u32, z: u32, c: u32) -> bool {
        let s = z / BITS_PER_BITFIELD;
        self.at(x, y, s, c) & (1 << (z % BITS_PER_BITFIELD)) != 0
    }

    /// Sets whether voxel `(x, y, z)` is occupied by component `c`.
    #[inline]
    pub fn set_occupied_at(&mut self, x: u32, y: u32, z: u32, c: u32, value: bool) {
        let s = z / BITS_PER_BITFIELD;
        let mask = 1 << (z % BITS_PER_BITFIELD);
        let word = self.at_mut(x, y, s, c);

        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Writes the raw words of this slicemap to the file at `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> io::Result<()> {
        write_raw_words(path, self.data())
    }

    /// Renders every non-empty column of every non-empty component as text.
    ///
    /// Each line shows one `(x, y)` column: `X` for occupied voxels and `.`
    /// for empty ones, with slabs separated by `|`.
    pub fn to_ascii(&self) -> String {
        let mut out = String::new();

        for c in 0..self.num_components {
            let mut header_written = false;

            for y in 0..self.y {
                for x in 0..self.x {
                    if (0..self.num_z_slabs).all(|s| self.at(x, y, s, c) == 0) {
                        continue;
                    }

                    if !header_written {
                        let _ = writeln!(out, "component {}:", c);
                        header_written = true;
                    }

                    let _ = write!(out, "  ({:4},{:4}) ", x, y);
                    for s in 0..self.num_z_slabs {
                        if s > 0 {
                            out.push('|');
                        }
                        let word = self.at(x, y, s, c);
                        for b in 0..BITS_PER_BITFIELD {
                            out.push(if word & (1 << b) != 0 { 'X' } else { '.' });
                        }
                    }
                    out.push('\n');
                }
            }
        }

        out
    }
}
