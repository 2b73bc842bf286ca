use super::{Occmapper, PipelineError, RenderLimits, ZRegionMaskLut};
use crate::math::{Point, Vector};
use crate::occupancy::{Occmap, Slicemap, SlotCounts, BITS_PER_BITFIELD};

/// A CPU implementation of the occmap aggregation stage.
///
/// For every component of a slicemap and every native voxel of the selected
/// region, the set bits of the voxel's `m × m × m` super-samples are counted.
/// A non-zero count claims the next slot of the voxel: the record is written
/// if a slot is still open, and the slot count of the voxel is incremented
/// either way, so overflows show up in [`Occmapper::check_slot_counts`].
#[derive(Clone, Debug)]
pub struct CpuOccmapper {
    limits: RenderLimits,
    occmap: Occmap,
    slot_counts: SlotCounts,
    z_masks: Option<ZRegionMaskLut>,
    box_corner: Point<u32>,
    box_size: Vector<u32>,
}

impl Default for CpuOccmapper {
    fn default() -> Self {
        Self::new(RenderLimits::default())
    }
}

impl CpuOccmapper {
    /// Creates an occmapper enforcing the given limits.
    pub fn new(limits: RenderLimits) -> Self {
        Self {
            limits,
            occmap: Occmap::new(),
            slot_counts: SlotCounts::default(),
            z_masks: None,
            box_corner: Point::origin(),
            box_size: Vector::zeros(),
        }
    }

    /// The magnification of the full-volume occmap, if allocated.
    pub fn magnification(&self) -> Option<u32> {
        self.z_masks.as_ref().map(|lut| lut.magnification())
    }

    /// Counts the super-samples of native voxel `(x, y, z)` of the selected region set in component `c`.
    fn coverage(&self, slicemap: &Slicemap, lut: &ZRegionMaskLut, voxel: [u32; 3], c: u32) -> u32 {
        let m = lut.magnification();
        let [x, y, z] = voxel;
        let first_slab = z * m / BITS_PER_BITFIELD;
        let last_slab = (((z + 1) * m - 1) / BITS_PER_BITFIELD)
            .min(slicemap.num_z_slabs() - 1)
            .min(lut.max_z_slabs() - 1);
        let mut count = 0;

        for s in first_slab..=last_slab {
            let mask = lut.get(z, s);
            for sy in y * m..(y + 1) * m {
                for sx in x * m..(x + 1) * m {
                    count += (slicemap.at(sx, sy, s, c) & mask).count_ones();
                }
            }
        }

        count
    }
}

impl Occmapper for CpuOccmapper {
    fn limits(&self) -> RenderLimits {
        self.limits
    }

    fn set_final_box(
        &mut self,
        num_voxels: &Vector<u32>,
        magnification: u32,
        num_slots: u32,
    ) -> Result<(), PipelineError> {
        let dim = self.limits.max_3d_texture_dim as u64;
        if num_voxels.x as u64 * num_slots as u64 > dim
            || num_voxels.y as u64 > dim
            || num_voxels.z as u64 > dim
        {
            return Err(PipelineError::OccmapTooLarge {
                num_voxels: (*num_voxels).into(),
                num_slots,
                max_3d_texture_dim: self.limits.max_3d_texture_dim,
            });
        }

        let denominator = match magnification.checked_pow(3) {
            Some(d) if d > 0 => d,
            _ => return Err(PipelineError::InvalidMagnification(magnification)),
        };

        self.z_masks = None;
        let _ = self
            .occmap
            .resize(num_voxels.x, num_voxels.y, num_voxels.z, num_slots)?;
        self.occmap.set_denominator(denominator);
        self.occmap.clear();
        self.slot_counts.reset(*num_voxels)?;
        self.z_masks = Some(ZRegionMaskLut::new(magnification, self.limits.max_z_slabs));
        self.box_corner = Point::origin();
        self.box_size = Vector::zeros();

        log::debug!(
            "occmap: {:?} voxels, {} slots, denominator {} ({} alpha bits)",
            num_voxels.as_slice(),
            num_slots,
            denominator,
            self.occmap.num_alpha_bits()
        );
        Ok(())
    }

    fn set_box(
        &mut self,
        corner: &Point<u32>,
        num_voxels: &Vector<u32>,
    ) -> Result<(), PipelineError> {
        if self.z_masks.is_none() {
            return Err(PipelineError::NoFinalBox);
        }

        let remaining = self
            .occmap
            .dims()
            .zip_map(&corner.coords, |d, c| d.saturating_sub(c));
        self.box_corner = *corner;
        self.box_size = num_voxels.inf(&remaining);

        self.occmap.clear_region(corner, &self.box_size);
        self.slot_counts.clear_region(corner, &self.box_size);
        Ok(())
    }

    fn render(&mut self, slicemap: &Slicemap, id_map: &[u32]) -> Result<&Occmap, PipelineError> {
        if slicemap.size() == 0 || self.box_size.iter().any(|e| *e == 0) {
            return Ok(&self.occmap);
        }

        let lut = self.z_masks.as_ref().ok_or(PipelineError::NoFinalBox)?;
        let m = lut.magnification();
        let expected = self.box_size * m;

        if slicemap.x() < expected.x
            || slicemap.y() < expected.y
            || slicemap.num_z_slabs() * BITS_PER_BITFIELD < expected.z
            || self.box_size.z > lut.max_native_z()
        {
            return Err(PipelineError::SlicemapMismatch {
                expected: expected.into(),
                found: [
                    slicemap.x(),
                    slicemap.y(),
                    slicemap.num_z_slabs() * BITS_PER_BITFIELD,
                ],
            });
        }

        if id_map.len() < slicemap.num_components() as usize {
            return Err(PipelineError::IdMapTooShort {
                id_map_len: id_map.len(),
                num_components: slicemap.num_components(),
            });
        }

        let k = self.occmap.num_alpha_bits();
        let num_slots = self.occmap.num_slots();
        let corner = self.box_corner;
        let mut writes = Vec::new();

        for c in 0..slicemap.num_components() {
            for z in 0..self.box_size.z {
                for y in 0..self.box_size.y {
                    for x in 0..self.box_size.x {
                        let count = self.coverage(slicemap, lut, [x, y, z], c);
                        if count > 0 {
                            let voxel = [corner.x + x, corner.y + y, corner.z + z];
                            writes.push((voxel, id_map[c as usize], count));
                        }
                    }
                }
            }
        }

        for ([x, y, z], id, alpha) in writes {
            let slot = self.slot_counts.at_mut(x, y, z);
            if *slot < num_slots {
                self.occmap.at_mut(x, y, z, *slot).set(id, alpha, k);
            }
            *slot += 1;
        }

        Ok(&self.occmap)
    }

    fn occmap(&self) -> &Occmap {
        &self.occmap
    }

    fn slot_counts(&self) -> &SlotCounts {
        &self.slot_counts
    }
}

#[cfg(test)]
mod test {
    use super::CpuOccmapper;
    use crate::math::{Point, Vector};
    use crate::occupancy::Slicemap;
    use crate::pipeline::{Occmapper, PipelineError, RenderLimits};

    #[test]
    fn supersamples_are_counted_per_native_voxel() {
        let mut occer = CpuOccmapper::default();
        occer.set_final_box(&Vector::new(4, 4, 4), 2, 2).unwrap();
        assert_eq!(occer.occmap().denominator(), 8);
        occer.set_box(&Point::new(1, 1, 1), &Vector::new(2, 2, 2)).unwrap();

        let mut slicemap = Slicemap::with_size(4, 4, 4, 1).unwrap();
        // Fill native voxel (0, 0, 0) of the region and 3 samples of (1, 0, 1).
        for (x, y, z) in [(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 1, 0)] {
            slicemap.set_occupied_at(x, y, z, 0, true);
            slicemap.set_occupied_at(x, y, z + 1, 0, true);
        }
        for (x, y, z) in [(2, 0, 2), (3, 0, 2), (2, 1, 3)] {
            slicemap.set_occupied_at(x, y, z, 0, true);
        }

        let occmap = occer.render(&slicemap, &[42]).unwrap();
        let k = occmap.num_alpha_bits();
        assert_eq!(occmap.at(1, 1, 1, 0).id(k), 42);
        assert_eq!(occmap.at(1, 1, 1, 0).alpha(k), 8);
        assert_eq!(occmap.at(2, 1, 2, 0).alpha(k), 3);
        assert!(occmap.at(1, 2, 1, 0).is_empty());
        assert!(occmap.at(1, 1, 1, 1).is_empty());
        assert_eq!(occer.slot_counts().at(1, 1, 1), 1);
        assert_eq!(occer.slot_counts().at(1, 2, 1), 0);
    }

    #[test]
    fn slot_overflow_is_counted_but_not_written() {
        let mut occer = CpuOccmapper::default();
        occer.set_final_box(&Vector::new(1, 1, 1), 1, 2).unwrap();
        occer.set_box(&Point::origin(), &Vector::new(1, 1, 1)).unwrap();

        let mut slicemap = Slicemap::with_size(1, 1, 1, 3).unwrap();
        for c in 0..3 {
            slicemap.set_occupied_at(0, 0, 0, c, true);
        }

        let _ = occer.render(&slicemap, &[5, 6, 7]).unwrap();
        let k = occer.occmap().num_alpha_bits();
        assert_eq!(occer.occmap().at(0, 0, 0, 0).id(k), 5);
        assert_eq!(occer.occmap().at(0, 0, 0, 1).id(k), 6);

        let overflows = occer.check_slot_counts();
        assert_eq!(overflows.len(), 1);
        assert_eq!(overflows[0].count, 3);
        assert_eq!(overflows[0].ids, vec![5, 6]);

        // Selecting the region again clears it.
        occer.set_box(&Point::origin(), &Vector::new(1, 1, 1)).unwrap();
        assert!(occer.check_slot_counts().is_empty());
        assert!(occer.occmap().at(0, 0, 0, 0).is_empty());
    }

    #[test]
    fn final_box_is_validated() {
        let mut occer = CpuOccmapper::new(RenderLimits {
            max_3d_texture_dim: 16,
            ..RenderLimits::default()
        });

        assert!(matches!(
            occer.set_final_box(&Vector::new(8, 4, 4), 1, 3),
            Err(PipelineError::OccmapTooLarge { .. })
        ));
        assert!(matches!(
            occer.set_final_box(&Vector::new(8, 4, 4), 0, 2),
            Err(PipelineError::InvalidMagnification(0))
        ));
        assert!(matches!(
            occer.set_box(&Point::origin(), &Vector::repeat(1)),
            Err(PipelineError::NoFinalBox)
        ));
        assert!(occer.set_final_box(&Vector::new(8, 4, 4), 1, 2).is_ok());
        assert_eq!(occer.occmap().num_slots(), 2);
    }
}
