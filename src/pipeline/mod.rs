//! The rasterization pipeline the voxelizer drives.
//!
//! A render pass over one subvolume goes through two stages:
//!
//! 1. A [`Slicemapper`] rasterizes a mesh whose triangles are tagged with
//!    per-pass *fake* component ids into a [`Slicemap`]: one Z-bitfield
//!    column per pixel and per fake id, where a bit is set iff the center of
//!    the corresponding super-sampled voxel is inside the component.
//! 2. An [`Occmapper`] counts, for each native voxel, the set bits of its
//!    `m × m × m` super-samples and writes `(true id, count)` records into
//!    the open slots of the full-volume [`Occmap`].
//!
//! GPU backends implement these traits outside of this crate. The
//! [`CpuSlicemapper`] and [`CpuOccmapper`] are exact CPU implementations of
//! the same contracts.

pub use self::cpu_occmapper::CpuOccmapper;
pub use self::cpu_slicemapper::CpuSlicemapper;
pub use self::luts::{depth_mask, z_region_mask, DepthMaskLut, ZRegionMaskLut};
pub use self::pipeline_error::PipelineError;
pub use self::render_limits::RenderLimits;

mod cpu_occmapper;
mod cpu_slicemapper;
mod luts;
mod pipeline_error;
mod render_limits;

use crate::math::{Point, Real, Vector};
use crate::occupancy::{Occmap, Slicemap, SlotCounts, SlotOverflow};
use crate::shape::IdMesh;
use std::io;
use std::path::Path;

/// Rasterizes id-tagged meshes into slicemaps.
pub trait Slicemapper {
    /// The size limits of the images this rasterizer can produce.
    fn limits(&self) -> RenderLimits;

    /// Configures the next slicemap.
    ///
    /// The slicemap covers the model-space box at `corner` with extents
    /// `extents`, sampled on an `image_size` voxel grid, for `num_components`
    /// fake ids. Fails if the image exceeds [`Self::limits`] or cannot be
    /// allocated.
    fn set_box(
        &mut self,
        corner: &Point<Real>,
        extents: &Vector<Real>,
        image_size: &Vector<u32>,
        num_components: u32,
    ) -> Result<(), PipelineError>;

    /// Rasterizes `mesh` into the configured slicemap.
    ///
    /// Triangles whose first vertex has id `i` fill component `i` of the
    /// slicemap, i.e. the Z slabs `[i * S, (i + 1) * S)` of the flattened
    /// image.
    fn voxelize(&mut self, mesh: &IdMesh) -> Result<&Slicemap, PipelineError>;

    /// The last slicemap produced.
    fn slicemap(&self) -> &Slicemap;
}

/// Folds slicemaps into a full-volume occmap.
pub trait Occmapper {
    /// The size limits of the images this backend can produce.
    fn limits(&self) -> RenderLimits;

    /// Allocates and clears the full-volume occmap.
    ///
    /// The occmap gets `num_slots` slots per voxel and distinguishes
    /// `magnification³` coverage levels.
    fn set_final_box(
        &mut self,
        num_voxels: &Vector<u32>,
        magnification: u32,
        num_slots: u32,
    ) -> Result<(), PipelineError>;

    /// Selects and clears the region of the occmap the next [`Self::render`] writes.
    ///
    /// The region is clamped to the occmap bounds.
    fn set_box(&mut self, corner: &Point<u32>, num_voxels: &Vector<u32>)
        -> Result<(), PipelineError>;

    /// Accumulates the coverage of every component of `slicemap` into the selected region.
    ///
    /// Component `i` of the slicemap is written under the true id `id_map[i]`.
    fn render(&mut self, slicemap: &Slicemap, id_map: &[u32]) -> Result<&Occmap, PipelineError>;

    /// The full-volume occmap.
    fn occmap(&self) -> &Occmap;

    /// The per-voxel count of components that claimed a slot.
    fn slot_counts(&self) -> &SlotCounts;

    /// Every voxel that was claimed by more components than it has slots.
    fn check_slot_counts(&self) -> Vec<SlotOverflow> {
        self.slot_counts().check(self.occmap())
    }

    /// Writes the raw slot counts to the file at `path`.
    fn write_slot_counts(&self, path: &Path) -> io::Result<()> {
        self.slot_counts().write(path)
    }
}
