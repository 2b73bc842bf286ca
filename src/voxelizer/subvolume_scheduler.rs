use super::VoxelizerError;
use crate::math::{Point, Vector};
use crate::model_map::{ComponentSet, ModelMap};
use crate::occupancy::{checked_volume, AllocationError};
use crate::pipeline::RenderLimits;

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
/// The axes along which a candidate subvolume may still grow.
pub struct GrowthAxes(u8);

bitflags::bitflags! {
    impl GrowthAxes: u8 {
        /// The subvolume may grow along X.
        const X = 1;
        /// The subvolume may grow along Y.
        const Y = 1 << 1;
        /// The subvolume may grow along Z.
        const Z = 1 << 2;
    }
}

impl GrowthAxes {
    /// The flag of the axis with index `dim`.
    #[inline]
    pub fn axis(dim: usize) -> Self {
        Self::from_bits_truncate(1 << dim)
    }
}

/// Progress of a scan over the boxes of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// The render state was reset and no box was visited yet.
    Idle,
    /// Some subvolumes were yielded and some boxes may remain.
    Scanning,
    /// Every box of the region is rendered.
    Done,
}

/// What the scheduler needs to know about a region render.
#[derive(Clone, Copy)]
pub struct ScanContext<'a> {
    /// The component index, keyed by box location.
    pub model_map: &'a ModelMap,
    /// The voxel coordinates of the first box of the region.
    pub region_corner: Point<u32>,
    /// The extents of the whole volume, in voxels.
    pub volume_size: Vector<u32>,
    /// The number of super-samples per voxel along each axis.
    pub magnification: u32,
    /// The limits of the slicemaps the backend can produce.
    pub limits: RenderLimits,
}

/// A group of boxes rendered in a single pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subvolume {
    /// The identifier written in the render state of each box, starting at 1.
    pub id: u32,
    /// The voxel coordinates of the first voxel.
    pub corner: Point<u32>,
    /// The extents in voxels, clamped to the whole volume.
    pub size: Vector<u32>,
    /// The box-grid coordinates of the first box, relative to the region.
    pub grid_corner: Point<u32>,
    /// The number of boxes along each axis.
    pub num_boxes: Vector<u32>,
    /// The components overlapping any of the boxes.
    pub components: ComponentSet,
}

/// Splits a region of boxes into subvolumes, one at a time.
///
/// Boxes are visited by increasing diagonal plane `x + y + z`, then by
/// increasing `z`, then by increasing `y`. The scan cursors persist between
/// calls to [`Self::next_subvolume`], so every box is visited once over a
/// complete scan. Each unrendered box found this way is grown greedily, one
/// box at a time in X, Y, Z order, for as long as the grown subvolume stays
/// inside the region, avoids rendered boxes, and fits the slicemap limits.
#[derive(Clone, Debug)]
pub struct SubvolumeScheduler {
    render_state: Vec<u32>,
    len: usize,
    num_boxes: Vector<u32>,
    plane: u32,
    cursor: Point<u32>,
    next_id: u32,
    state: ScanState,
}

impl Default for SubvolumeScheduler {
    fn default() -> Self {
        Self {
            render_state: Vec::new(),
            len: 0,
            num_boxes: Vector::zeros(),
            plane: 0,
            cursor: Point::origin(),
            next_id: 1,
            state: ScanState::Idle,
        }
    }
}

impl SubvolumeScheduler {
    /// Creates a scheduler over an empty region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new scan over a region of `num_boxes` boxes.
    ///
    /// Every box is marked unrendered and the subvolume ids restart at 1.
    pub fn reset(&mut self, num_boxes: Vector<u32>) -> Result<(), AllocationError> {
        let dims = [num_boxes.x, num_boxes.y, num_boxes.z, 1];
        let Some(len) = checked_volume(dims) else {
            *self = Self::default();
            return Err(AllocationError::SizeOverflow {
                map: "render state grid",
                dims,
            });
        };

        match crate::occupancy::grow_zeroed(&mut self.render_state, len) {
            Ok(true) => {}
            Ok(false) => self.render_state[..len].fill(0),
            Err(source) => {
                *self = Self::default();
                return Err(AllocationError::OutOfMemory {
                    map: "render state grid",
                    dims,
                    words: len,
                    source,
                });
            }
        }

        self.len = len;
        self.num_boxes = num_boxes;
        self.plane = 0;
        self.cursor = Point::origin();
        self.next_id = 1;
        self.state = ScanState::Idle;
        Ok(())
    }

    /// The number of boxes of the region along each axis.
    #[inline]
    pub fn num_boxes(&self) -> Vector<u32> {
        self.num_boxes
    }

    /// The progress of the current scan.
    #[inline]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// The id of the subvolume each box belongs to, or 0 for unrendered boxes.
    ///
    /// Boxes are laid out with X varying fastest, then Y, then Z.
    #[inline]
    pub fn render_state(&self) -> &[u32] {
        &self.render_state[..self.len]
    }

    #[inline]
    fn index(&self, b: &Point<u32>) -> usize {
        let (nx, ny) = (self.num_boxes.x as usize, self.num_boxes.y as usize);
        b.x as usize + nx * (b.y as usize + ny * b.z as usize)
    }

    /// The id of the subvolume the box at grid coordinates `b` belongs to, or 0.
    #[inline]
    pub fn rendered_at(&self, b: &Point<u32>) -> u32 {
        self.render_state[self.index(b)]
    }

    fn any_rendered(&self, corner: &Point<u32>, num_boxes: &Vector<u32>) -> bool {
        for z in corner.z..corner.z + num_boxes.z {
            for y in corner.y..corner.y + num_boxes.y {
                for x in corner.x..corner.x + num_boxes.x {
                    if self.rendered_at(&Point::new(x, y, z)) > 0 {
                        return true;
                    }
                }
            }
        }

        false
    }

    /// Finds, grows and marks the next subvolume.
    ///
    /// Returns `Ok(None)` once every box of the region is rendered. Fails with
    /// [`VoxelizerError::BoxTooLarge`] if the next unrendered box alone does
    /// not fit the slicemap limits of `ctx`.
    pub fn next_subvolume(
        &mut self,
        ctx: &ScanContext,
    ) -> Result<Option<Subvolume>, VoxelizerError> {
        match self.state {
            ScanState::Done => return Ok(None),
            ScanState::Idle if self.len == 0 => {
                self.state = ScanState::Done;
                return Ok(None);
            }
            _ => self.state = ScanState::Scanning,
        }

        let nb = self.num_boxes;
        // Coordinates are one less than the box counts, hence the `+ 2`.
        let box_count_sum = nb.x.saturating_add(nb.y).saturating_add(nb.z);

        while self.plane + 2 < box_count_sum {
            while self.cursor.z < (self.plane + 1).min(nb.z) {
                while self.cursor.y < (self.plane + 1 - self.cursor.z).min(nb.y) {
                    self.cursor.x = self.plane - self.cursor.y - self.cursor.z;
                    if self.cursor.x >= nb.x || self.rendered_at(&self.cursor) > 0 {
                        self.cursor.y += 1;
                        continue;
                    }

                    return self.grow_subvolume(ctx).map(Some);
                }
                self.cursor.y = 0;
                self.cursor.z += 1;
            }
            self.cursor.z = 0;
            self.plane += 1;
        }

        log::debug!(
            "scan complete: {} subvolumes for {:?} boxes",
            self.next_id - 1,
            nb.as_slice()
        );
        self.state = ScanState::Done;
        Ok(None)
    }

    fn grow_subvolume(&mut self, ctx: &ScanContext) -> Result<Subvolume, VoxelizerError> {
        let box_size = ctx.model_map.model_space().box_size();
        let grid_corner = self.cursor;
        let corner = ctx.region_corner + grid_corner.coords.component_mul(&box_size);
        let remaining = ctx
            .volume_size
            .zip_map(&corner.coords, |s, c| s.saturating_sub(c));
        let image_of = |num_boxes: &Vector<u32>| {
            box_size
                .zip_map(num_boxes, |b, n| b.saturating_mul(n))
                .inf(&remaining)
                .map(|e| e.saturating_mul(ctx.magnification))
        };

        let mut num_boxes = Vector::repeat(1);
        let mut components = ComponentSet::new();
        ctx.model_map
            .union_components_in_region(&corner, &num_boxes, &mut components);

        let image = image_of(&num_boxes);
        if !ctx.limits.admits_slicemap(&image, components.len()) {
            let image_size = RenderLimits::slicemap_image_size(&image, components.len());
            log::error!(
                "the box at {:?} is too large to render: {} components at magnification {} need a slicemap of {:?} (limits: {:?})",
                corner.coords.as_slice(),
                components.len(),
                ctx.magnification,
                image_size,
                ctx.limits
            );
            return Err(VoxelizerError::BoxTooLarge {
                location: corner.into(),
                image_size,
                num_components: components.len(),
                limits: ctx.limits,
            });
        }

        let mut growing = GrowthAxes::all();
        let mut try_dim = 2;

        while !growing.is_empty() {
            try_dim = (try_dim + 1) % 3;
            let axis = GrowthAxes::axis(try_dim);
            if !growing.contains(axis) {
                continue;
            }

            if grid_corner[try_dim] + num_boxes[try_dim] >= self.num_boxes[try_dim] {
                growing.remove(axis);
                continue;
            }

            let mut slice_corner = grid_corner;
            slice_corner[try_dim] += num_boxes[try_dim];
            let mut slice = num_boxes;
            slice[try_dim] = 1;
            if self.any_rendered(&slice_corner, &slice) {
                growing.remove(axis);
                continue;
            }

            let mut grown = num_boxes;
            grown[try_dim] += 1;
            let mut grown_components = ComponentSet::new();
            ctx.model_map
                .union_components_in_region(&corner, &grown, &mut grown_components);

            if ctx
                .limits
                .admits_slicemap(&image_of(&grown), grown_components.len())
            {
                num_boxes = grown;
                components = grown_components;
            } else {
                growing.remove(axis);
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        for z in 0..num_boxes.z {
            for y in 0..num_boxes.y {
                for x in 0..num_boxes.x {
                    let i = self.index(&(grid_corner + Vector::new(x, y, z)));
                    self.render_state[i] = id;
                }
            }
        }

        let size = box_size.component_mul(&num_boxes).inf(&remaining);
        log::debug!(
            "subvolume {}: {:?} boxes at {:?} ({:?} voxels), {} components",
            id,
            num_boxes.as_slice(),
            corner.coords.as_slice(),
            size.as_slice(),
            components.len()
        );

        Ok(Subvolume {
            id,
            corner,
            size,
            grid_corner,
            num_boxes,
            components,
        })
    }
}
