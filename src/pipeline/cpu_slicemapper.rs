use super::{DepthMaskLut, PipelineError, RenderLimits, Slicemapper};
use crate::lattice::ceil_divide;
use crate::math::{Point, Real, Vector};
use crate::occupancy::{Slicemap, BITS_PER_BITFIELD};
use crate::shape::IdMesh;
use na::Point3;

/// A CPU rasterizer producing slicemaps.
///
/// Every triangle is projected along Z onto the image. For each pixel whose
/// center it covers, the depth mask of the triangle depth at that center is
/// XOR-ed into the pixel column of the triangle's component. Depths are
/// clamped to the image, so geometry in front of or behind the box still
/// toggles the right parity. Shared edges are resolved with a top-left rule,
/// so each pixel center is covered exactly once by a closed fan of triangles.
#[derive(Clone, Debug)]
pub struct CpuSlicemapper {
    limits: RenderLimits,
    depth_masks: DepthMaskLut,
    slicemap: Slicemap,
    corner: Point<Real>,
    extents: Vector<Real>,
    image_size: Vector<u32>,
}

impl Default for CpuSlicemapper {
    fn default() -> Self {
        Self::new(RenderLimits::default())
    }
}

impl CpuSlicemapper {
    /// Creates a rasterizer enforcing the given limits.
    pub fn new(limits: RenderLimits) -> Self {
        Self {
            limits,
            depth_masks: DepthMaskLut::new(limits.max_z_slabs),
            slicemap: Slicemap::new(),
            corner: Point::origin(),
            extents: Vector::zeros(),
            image_size: Vector::zeros(),
        }
    }

    fn reset_box(&mut self) {
        self.slicemap.free();
        self.corner = Point::origin();
        self.extents = Vector::zeros();
        self.image_size = Vector::zeros();
    }

    fn to_image(&self, pt: &Point<Real>) -> Point3<f64> {
        let mut result = Point3::origin();
        for i in 0..3 {
            result[i] = (pt[i] - self.corner[i]) as f64 * self.image_size[i] as f64
                / self.extents[i] as f64;
        }
        result
    }

    fn rasterize_triangle(&mut self, tri: [Point3<f64>; 3], component: u32) {
        let [mut a, mut b, c] = tri;
        let area = edge(&a, &b, &c);
        if area == 0.0 {
            // Seen edge-on: a closed surface is crossed by its neighbors.
            return;
        }
        if area < 0.0 {
            core::mem::swap(&mut a, &mut b);
        }
        let area = area.abs();

        let (nx, ny) = (self.image_size.x, self.image_size.y);
        let (Some(xs), Some(ys)) = (
            pixel_range(a.x.min(b.x).min(c.x), a.x.max(b.x).max(c.x), nx),
            pixel_range(a.y.min(b.y).min(c.y), a.y.max(b.y).max(c.y), ny),
        ) else {
            return;
        };

        let owned = [owns_edge(&b, &c), owns_edge(&c, &a), owns_edge(&a, &b)];
        let num_z_slabs = self.slicemap.num_z_slabs();

        for j in ys {
            for i in xs.clone() {
                let p = Point3::new(i as f64 + 0.5, j as f64 + 0.5, 0.0);
                let w = [edge(&b, &c, &p), edge(&c, &a, &p), edge(&a, &b, &p)];

                if (0..3).any(|k| w[k] < 0.0 || (w[k] == 0.0 && !owned[k])) {
                    continue;
                }

                let depth = (w[0] * a.z + w[1] * b.z + w[2] * c.z) / area;
                let n = (depth - 0.5).ceil().clamp(0.0, self.image_size.z as f64) as u32;

                for s in 0..num_z_slabs {
                    *self.slicemap.at_mut(i, j, s, component) ^= self.depth_masks.get(n, s);
                }
            }
        }
    }
}

/// Twice the signed area of `(a, b, p)` projected on the XY plane.
#[inline]
fn edge(a: &Point3<f64>, b: &Point3<f64>, p: &Point3<f64>) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Does the edge `a -> b` of a counterclockwise triangle own the points lying exactly on it?
#[inline]
fn owns_edge(a: &Point3<f64>, b: &Point3<f64>) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    dy > 0.0 || (dy == 0.0 && dx < 0.0)
}

/// The pixels whose centers lie in `[min, max]`, clamped to `0..n`.
fn pixel_range(min: f64, max: f64, n: u32) -> Option<core::ops::Range<u32>> {
    let lo = (min - 0.5).ceil().max(0.0);
    let hi = (max - 0.5).floor().min(n as f64 - 1.0);

    (lo <= hi).then(|| (lo as u32)..(hi as u32 + 1))
}

impl Slicemapper for CpuSlicemapper {
    fn limits(&self) -> RenderLimits {
        self.limits
    }

    fn set_box(
        &mut self,
        corner: &Point<Real>,
        extents: &Vector<Real>,
        image_size: &Vector<u32>,
        num_components: u32,
    ) -> Result<(), PipelineError> {
        let num_z_slabs = ceil_divide(image_size.z, BITS_PER_BITFIELD);
        let dim = self.limits.max_3d_texture_dim as u64;

        if image_size.x as u64 > dim
            || image_size.y as u64 > dim
            || num_z_slabs as u64 * num_components as u64 > dim
            || num_z_slabs > self.limits.max_z_slabs
        {
            self.reset_box();
            return Err(PipelineError::SlicemapTooLarge {
                image_size: (*image_size).into(),
                num_components,
                limits: self.limits,
            });
        }

        if let Err(e) =
            self.slicemap
                .resize(image_size.x, image_size.y, image_size.z, num_components)
        {
            self.reset_box();
            return Err(e.into());
        }

        self.corner = *corner;
        self.extents = *extents;
        self.image_size = *image_size;
        Ok(())
    }

    fn voxelize(&mut self, mesh: &IdMesh) -> Result<&Slicemap, PipelineError> {
        if self.slicemap.size() == 0 {
            return Ok(&self.slicemap);
        }

        self.slicemap.clear();
        let num_components = self.slicemap.num_components();

        for ti in 0..mesh.tris.len() {
            let verts = mesh.triangle(ti);
            let fake_id = verts[0].id;
            if fake_id >= num_components {
                return Err(PipelineError::FakeIdOutOfRange {
                    triangle: ti,
                    fake_id,
                    num_components,
                });
            }

            let tri = verts.map(|v| self.to_image(&v.position));
            self.rasterize_triangle(tri, fake_id);
        }

        Ok(&self.slicemap)
    }

    fn slicemap(&self) -> &Slicemap {
        &self.slicemap
    }
}
