use crate::lattice::ceil_divide;
use crate::math::Vector;
use crate::occupancy::BITS_PER_BITFIELD;

/// Size limits of the images a rasterization backend can work with.
///
/// The defaults match the limits of a typical OpenGL 4 implementation.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    /// The largest extent of a 3D image along any axis.
    ///
    /// Default: `2048`
    pub max_3d_texture_dim: u32,
    /// The largest number of 32-voxel Z slabs per component in a slicemap.
    ///
    /// Default: `32`
    pub max_z_slabs: u32,
    /// The largest number of words in a slicemap.
    ///
    /// Default: `100_000_000`
    pub max_slicemap_texels: u64,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            max_3d_texture_dim: 2048,
            max_z_slabs: 32,
            max_slicemap_texels: 100_000_000,
        }
    }
}

impl RenderLimits {
    /// The extents of the flattened slicemap image for `image_voxels` and `num_components`.
    ///
    /// Z is compressed to 32-bit slabs and then multiplied by the number of
    /// components, matching the way slicemaps are stored.
    pub fn slicemap_image_size(image_voxels: &Vector<u32>, num_components: usize) -> [u64; 3] {
        let slabs = ceil_divide(image_voxels.z, BITS_PER_BITFIELD) as u64;
        [
            image_voxels.x as u64,
            image_voxels.y as u64,
            slabs * num_components as u64,
        ]
    }

    /// Can a slicemap of `image_voxels` voxels and `num_components` components be rendered?
    pub fn admits_slicemap(&self, image_voxels: &Vector<u32>, num_components: usize) -> bool {
        let dim = self.max_3d_texture_dim as u64;
        let [x, y, z] = Self::slicemap_image_size(image_voxels, num_components);
        let slabs = ceil_divide(image_voxels.z, BITS_PER_BITFIELD);

        x <= dim
            && y <= dim
            && z <= dim
            && slabs <= self.max_z_slabs
            && x.saturating_mul(y).saturating_mul(z) <= self.max_slicemap_texels
    }

    /// The largest number of occmap slots a volume of X extent `size_x` can have.
    pub fn max_occmap_slots(&self, size_x: u32) -> u32 {
        self.max_3d_texture_dim.checked_div(size_x).unwrap_or(0)
    }
}
