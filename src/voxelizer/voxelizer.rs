use super::{ScanContext, Subvolume, SubvolumeScheduler, VoxelizerError};
use crate::lattice::ceil_divide_vec;
use crate::math::{Point, Real, Vector};
use crate::model_map::{ModelMap, SharedModelMap};
use crate::occupancy::{max_component_id, Occmap, Slicemap, SlotCounts, SlotOverflow};
use crate::pipeline::{CpuOccmapper, CpuSlicemapper, Occmapper, RenderLimits, Slicemapper};
use crate::shape::IdMesh;
use std::io;
use std::path::Path;

/// The subvolumes scheduled by one region render, in rendering order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Every subvolume, including those with no component.
    pub subvolumes: Vec<Subvolume>,
}

impl RenderReport {
    /// The number of boxes rendered.
    pub fn num_boxes(&self) -> u64 {
        self.subvolumes
            .iter()
            .map(|sv| sv.num_boxes.iter().map(|n| *n as u64).product::<u64>())
            .sum()
    }
}

/// Drives a rasterization pipeline over a model to fill a full-volume occmap.
///
/// The voxelizer must be given the whole volume with
/// [`Self::set_whole_volume`] and a model map with [`Self::set_model_map`]
/// before anything can be rendered. Each render splits the requested region
/// into subvolumes with a [`SubvolumeScheduler`] and runs them one after the
/// other through the slicemapper and the occmapper. The model map is
/// read-locked for the whole render.
pub struct Voxelizer<S, O> {
    slicemapper: S,
    occmapper: O,
    scheduler: SubvolumeScheduler,
    model_map: Option<SharedModelMap>,
    whole_volume: Option<Vector<u32>>,
    magnification: u32,
    mesh: IdMesh,
    id_map: Vec<u32>,
}

impl Voxelizer<CpuSlicemapper, CpuOccmapper> {
    /// A voxelizer running both pipeline stages on the CPU.
    pub fn cpu(limits: RenderLimits) -> Self {
        Self::new(CpuSlicemapper::new(limits), CpuOccmapper::new(limits))
    }
}

impl<S: Slicemapper, O: Occmapper> Voxelizer<S, O> {
    /// Creates a voxelizer driving the given pipeline stages.
    pub fn new(slicemapper: S, occmapper: O) -> Self {
        Self {
            slicemapper,
            occmapper,
            scheduler: SubvolumeScheduler::new(),
            model_map: None,
            whole_volume: None,
            magnification: 1,
            mesh: IdMesh::new(),
            id_map: Vec::new(),
        }
    }

    /// Allocates the full-volume occmap with as many overlap slots as the backend allows.
    ///
    /// The occmap is stored as an image whose X extent is `size.x` times the
    /// number of slots, so the slot count is `max_3d_texture_dim / size.x`.
    /// Returns the number of slots.
    pub fn set_whole_volume(
        &mut self,
        size: Vector<u32>,
        magnification: u32,
    ) -> Result<u32, VoxelizerError> {
        let num_slots = self.occmapper.limits().max_occmap_slots(size.x);
        self.set_whole_volume_with_slots(size, magnification, num_slots)
    }

    /// Allocates the full-volume occmap with up to `num_slots` overlap slots per voxel.
    ///
    /// A request for more slots than the backend allows is clamped with a
    /// warning. Returns the number of slots actually allocated.
    pub fn set_whole_volume_with_slots(
        &mut self,
        size: Vector<u32>,
        magnification: u32,
        num_slots: u32,
    ) -> Result<u32, VoxelizerError> {
        self.whole_volume = None;

        if magnification == 0 {
            return Err(VoxelizerError::InvalidMagnification(magnification));
        }

        let limits = self.occmapper.limits();
        let max_slots = limits.max_occmap_slots(size.x);
        if size.iter().any(|e| *e == 0) || max_slots == 0 {
            return Err(VoxelizerError::InvalidVolume {
                size: size.into(),
                max_3d_texture_dim: limits.max_3d_texture_dim,
            });
        }

        let num_slots = if num_slots > max_slots {
            log::warn!(
                "too many occmap slots requested: using {} instead of {}",
                max_slots,
                num_slots
            );
            max_slots
        } else {
            num_slots
        };

        self.occmapper
            .set_final_box(&size, magnification, num_slots)?;
        self.whole_volume = Some(size);
        self.magnification = magnification;
        Ok(num_slots)
    }

    /// Installs the component index used by the next renders.
    pub fn set_model_map(&mut self, model_map: SharedModelMap) {
        self.model_map = Some(model_map);
    }

    /// Renders the whole volume, rounded up to a multiple of the box size.
    pub fn render_all(&mut self) -> Result<RenderReport, VoxelizerError> {
        let size = self
            .whole_volume
            .ok_or(VoxelizerError::MissingWholeVolume)?;
        let box_size = {
            let model_map = self
                .model_map
                .as_ref()
                .ok_or(VoxelizerError::MissingModelMap)?
                .read()
                .map_err(|_| VoxelizerError::PoisonedModelMap)?;
            model_map.model_space().box_size()
        };

        let rounded = box_size.component_mul(&ceil_divide_vec(&size, &box_size));
        self.render_region(&Point::origin(), &rounded)
    }

    /// Renders the region at `corner` with extents `size`, in voxels.
    ///
    /// `corner` should be a box location and `size` a multiple of the box
    /// size, otherwise the boxes of the region do not line up with the keys of
    /// the model map. Voxels of the region outside of the whole volume are
    /// ignored.
    pub fn render_region(
        &mut self,
        corner: &Point<u32>,
        size: &Vector<u32>,
    ) -> Result<RenderReport, VoxelizerError> {
        let volume_size = self
            .whole_volume
            .ok_or(VoxelizerError::MissingWholeVolume)?;
        let shared = self
            .model_map
            .clone()
            .ok_or(VoxelizerError::MissingModelMap)?;
        let model_map = shared
            .read()
            .map_err(|_| VoxelizerError::PoisonedModelMap)?;

        let num_boxes = ceil_divide_vec(size, &model_map.model_space().box_size());
        self.scheduler.reset(num_boxes)?;

        let ctx = ScanContext {
            model_map: &model_map,
            region_corner: *corner,
            volume_size,
            magnification: self.magnification,
            limits: self.slicemapper.limits(),
        };
        let max_id = max_component_id(self.occmapper.occmap().num_alpha_bits());
        let mut report = RenderReport::default();

        while let Some(subvolume) = self.scheduler.next_subvolume(&ctx)? {
            self.render_subvolume(&model_map, &subvolume, max_id)?;
            report.subvolumes.push(subvolume);
        }

        Ok(report)
    }

    fn render_subvolume(
        &mut self,
        model_map: &ModelMap,
        subvolume: &Subvolume,
        max_id: u32,
    ) -> Result<(), VoxelizerError> {
        if subvolume.size.iter().any(|e| *e == 0) {
            log::debug!(
                "subvolume {} lies outside of the whole volume",
                subvolume.id
            );
            return Ok(());
        }

        // Fake ids follow the iteration order of the component set.
        self.mesh.clear();
        self.id_map.clear();
        for (fake_id, id) in subvolume.components.iter().enumerate() {
            if *id > max_id {
                return Err(VoxelizerError::ComponentIdOverflow { id: *id, max_id });
            }

            let component = model_map
                .component(*id)
                .ok_or(VoxelizerError::UnknownComponent(*id))?;
            component.add_triangles_to_mesh_with_id(&mut self.mesh, fake_id as u32);
            self.id_map.push(*id);
        }

        let image_size = subvolume.size * self.magnification;
        self.slicemapper.set_box(
            &subvolume.corner.map(|e| e as Real),
            &subvolume.size.map(|e| e as Real),
            &image_size,
            self.id_map.len() as u32,
        )?;
        self.occmapper.set_box(&subvolume.corner, &subvolume.size)?;

        let slicemap = self.slicemapper.voxelize(&self.mesh)?;
        let _ = self.occmapper.render(slicemap, &self.id_map)?;
        Ok(())
    }

    /// The extents of the whole volume, if set.
    #[inline]
    pub fn whole_volume(&self) -> Option<Vector<u32>> {
        self.whole_volume
    }

    /// The magnification of the whole volume.
    #[inline]
    pub fn magnification(&self) -> u32 {
        self.magnification
    }

    /// The slicemapper driven by this voxelizer.
    #[inline]
    pub fn slicemapper(&self) -> &S {
        &self.slicemapper
    }

    /// The occmapper driven by this voxelizer.
    #[inline]
    pub fn occmapper(&self) -> &O {
        &self.occmapper
    }

    /// The slicemap of the last rendered subvolume.
    #[inline]
    pub fn slicemap(&self) -> &Slicemap {
        self.slicemapper.slicemap()
    }

    /// The full-volume occmap.
    #[inline]
    pub fn occmap(&self) -> &Occmap {
        self.occmapper.occmap()
    }

    /// How many components claimed a slot of each voxel.
    #[inline]
    pub fn slot_counts(&self) -> &SlotCounts {
        self.occmapper.slot_counts()
    }

    /// The subvolume id of each box of the last rendered region.
    #[inline]
    pub fn render_state(&self) -> &[u32] {
        self.scheduler.render_state()
    }

    /// Every voxel where overlaps were dropped for lack of slots.
    pub fn check_slot_counts(&self) -> Vec<SlotOverflow> {
        self.occmapper.check_slot_counts()
    }

    /// Dumps the raw occmap words to `path`.
    pub fn write_occmap(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.occmap().write(path)
    }

    /// Dumps the raw slot counts to `path`.
    pub fn write_slot_counts(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.occmapper.write_slot_counts(path.as_ref())
    }
}
