use crate::bounding_volume::Aabb;
use crate::math::{Point, Real, Vector};

/// Error indicating that a [`ModelSpace`] could not be built.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSpaceError {
    /// One component of the box size is zero.
    #[error("the box size {0:?} has a zero component")]
    ZeroBoxSize([u32; 3]),
    /// Rounding the model size up to whole boxes does not fit in a `u32`.
    #[error("the model size {size:?} rounded up to boxes of size {box_size:?} overflows")]
    SizeOverflow {
        /// The requested model size.
        size: [u32; 3],
        /// The requested box size.
        box_size: [u32; 3],
    },
}

/// `ceil(a / b)` for non-negative integers.
///
/// # Panics
///
/// Panics if `b == 0`.
#[inline]
pub fn ceil_divide(a: u32, b: u32) -> u32 {
    a.div_ceil(b)
}

/// Componentwise [`ceil_divide`].
#[inline]
pub fn ceil_divide_vec(a: &Vector<u32>, b: &Vector<u32>) -> Vector<u32> {
    a.zip_map(b, ceil_divide)
}

/// The lattice of render boxes tiling a model space.
///
/// A `ModelSpace` is immutable once built: changing the box size or the model
/// size means building a new one, and every structure keyed by box locations
/// (like a [`ModelMap`](crate::model_map::ModelMap)) owns the `ModelSpace` it
/// was built for.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModelSpace {
    box_size: Vector<u32>,
    size: Vector<u32>,
    size_rounded_to_boxes: Vector<u32>,
    num_boxes: Vector<u32>,
}

impl ModelSpace {
    /// Creates the lattice of boxes of size `box_size` covering a model of size `size`.
    ///
    /// Fails if `box_size` has a zero component or if `size` rounded up to a
    /// multiple of `box_size` does not fit in a `u32`.
    pub fn new(box_size: Vector<u32>, size: Vector<u32>) -> Result<Self, ModelSpaceError> {
        if box_size.iter().any(|e| *e == 0) {
            return Err(ModelSpaceError::ZeroBoxSize(box_size.into()));
        }

        let num_boxes = ceil_divide_vec(&size, &box_size);
        let mut size_rounded_to_boxes = Vector::zeros();

        for i in 0..3 {
            size_rounded_to_boxes[i] = num_boxes[i].checked_mul(box_size[i]).ok_or(
                ModelSpaceError::SizeOverflow {
                    size: size.into(),
                    box_size: box_size.into(),
                },
            )?;
        }

        Ok(Self {
            box_size,
            size,
            size_rounded_to_boxes,
            num_boxes,
        })
    }

    /// The same box lattice, covering a model of a different size.
    pub fn with_size(&self, size: Vector<u32>) -> Result<Self, ModelSpaceError> {
        Self::new(self.box_size, size)
    }

    /// The size of every render box.
    #[inline]
    pub fn box_size(&self) -> Vector<u32> {
        self.box_size
    }

    /// The true extent of the model, in voxels.
    #[inline]
    pub fn size(&self) -> Vector<u32> {
        self.size
    }

    /// The model size rounded up to a componentwise multiple of the box size.
    #[inline]
    pub fn size_rounded_to_boxes(&self) -> Vector<u32> {
        self.size_rounded_to_boxes
    }

    /// The number of boxes along each axis overlapping the model.
    #[inline]
    pub fn num_boxes(&self) -> Vector<u32> {
        self.num_boxes
    }

    /// The location of the box containing the voxel `voxel`.
    #[inline]
    pub fn box_containing_voxel(&self, voxel: &Point<u32>) -> Point<u32> {
        Point::from(
            voxel
                .coords
                .component_div(&self.box_size)
                .component_mul(&self.box_size),
        )
    }

    /// The location of the box containing the point `point`.
    ///
    /// This computes `floor(point / box_size) * box_size`. The point must have
    /// non-negative coordinates: negative coordinates are not checked and are
    /// mapped to the box at 0 on the offending axis.
    #[inline]
    pub fn box_containing(&self, point: &Point<Real>) -> Point<u32> {
        self.box_containing_voxel(&point.map(|e| e as u32))
    }

    /// The componentwise min and max of a set of box locations.
    ///
    /// Returns `None` if `boxes` is empty.
    pub fn min_max_boxes<'a>(
        boxes: impl IntoIterator<Item = &'a Point<u32>>,
    ) -> Option<(Point<u32>, Point<u32>)> {
        let mut it = boxes.into_iter();
        let first = *it.next()?;
        Some(it.fold((first, first), |(mins, maxs), b| {
            (mins.inf(b), maxs.sup(b))
        }))
    }

    /// Appends to `out` every box of the smallest box-aligned cuboid containing all of `boxes`.
    ///
    /// Boxes are pushed with X varying fastest, then Y, then Z, so the first
    /// pushed box is the min box and the last one is the max box. Returns
    /// `false` and leaves `out` untouched if `boxes` is empty.
    pub fn boxes_in_bounding_box<'a>(
        &self,
        boxes: impl IntoIterator<Item = &'a Point<u32>>,
        out: &mut Vec<Point<u32>>,
    ) -> bool {
        let Some((mins, maxs)) = Self::min_max_boxes(boxes) else {
            return false;
        };
        let counts = (maxs - mins)
            .component_div(&self.box_size)
            .add_scalar(1);
        out.reserve(counts.iter().map(|c| *c as usize).product());

        let mut b = mins;
        while b.z <= maxs.z {
            b.y = mins.y;
            while b.y <= maxs.y {
                b.x = mins.x;
                while b.x <= maxs.x {
                    out.push(b);
                    b.x += self.box_size.x;
                }
                b.y += self.box_size.y;
            }
            b.z += self.box_size.z;
        }

        true
    }

    /// The range of boxes touched by `aabb`, clamped to the boxes of the model.
    ///
    /// Returns the inclusive `(min_box, max_box)` locations, or `None` if the
    /// AABB is invalid or lies entirely outside of the model. Voxels are open
    /// intervals, so a box the AABB only touches with its upper faces is not
    /// included.
    pub fn boxes_overlapping_aabb(&self, aabb: &Aabb) -> Option<(Point<u32>, Point<u32>)> {
        if !aabb.is_valid() || self.num_boxes.iter().any(|n| *n == 0) {
            return None;
        }

        let mut mins = Point::origin();
        let mut maxs = Point::origin();

        for i in 0..3 {
            let extent = self.size_rounded_to_boxes[i] as Real;
            if aabb.maxs[i] < 0.0
                || aabb.mins[i] >= extent
                || (aabb.maxs[i] <= 0.0 && aabb.mins[i] < aabb.maxs[i])
            {
                return None;
            }

            let last_box = self.num_boxes[i] - 1;
            let lo_voxel = aabb.mins[i].max(0.0) as u32;
            // The last voxel whose open interval meets `(mins, maxs)`.
            let hi_voxel = (aabb.maxs[i].min(extent).ceil() as u32)
                .saturating_sub(1)
                .max(lo_voxel);
            let lo = (lo_voxel / self.box_size[i]).min(last_box);
            let hi = (hi_voxel / self.box_size[i]).min(last_box);
            mins[i] = lo * self.box_size[i];
            maxs[i] = hi * self.box_size[i];
        }

        Some((mins, maxs))
    }

    /// Converts coordinates on the box grid into a box location.
    #[inline]
    pub fn box_location(&self, grid_coords: &Point<u32>) -> Point<u32> {
        Point::from(grid_coords.coords.component_mul(&self.box_size))
    }
}
