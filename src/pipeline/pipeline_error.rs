use super::RenderLimits;
use crate::occupancy::AllocationError;

/// Errors reported by a rasterization backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The requested slicemap exceeds the limits of the backend.
    #[error("a slicemap of {image_size:?} voxels with {num_components} components exceeds the limits {limits:?}")]
    SlicemapTooLarge {
        /// The requested image size, in super-sampled voxels.
        image_size: [u32; 3],
        /// The requested number of components.
        num_components: u32,
        /// The limits of the backend.
        limits: RenderLimits,
    },
    /// The requested occmap exceeds the limits of the backend.
    #[error("an occmap of {num_voxels:?} voxels with {num_slots} slots exceeds the maximum image extent {max_3d_texture_dim}")]
    OccmapTooLarge {
        /// The requested volume size.
        num_voxels: [u32; 3],
        /// The requested number of slots per voxel.
        num_slots: u32,
        /// The largest image extent of the backend.
        max_3d_texture_dim: u32,
    },
    /// The magnification is zero or its cube does not fit in a `u32`.
    #[error("invalid magnification {0}")]
    InvalidMagnification(u32),
    /// A region was selected before the full-volume occmap was allocated.
    #[error("no full-volume occmap has been allocated")]
    NoFinalBox,
    /// A slicemap does not match the region selected on the occmapper.
    #[error("a slicemap of {found:?} voxels cannot cover a region of {expected:?} super-sampled voxels")]
    SlicemapMismatch {
        /// The super-sampled extents of the selected region.
        expected: [u32; 3],
        /// The extents of the slicemap.
        found: [u32; 3],
    },
    /// The id map has fewer entries than the slicemap has components.
    #[error("the id map has {id_map_len} entries but the slicemap has {num_components} components")]
    IdMapTooShort {
        /// The number of entries of the id map.
        id_map_len: usize,
        /// The number of components of the slicemap.
        num_components: u32,
    },
    /// A mesh triangle is tagged with a fake id the slicemap has no component for.
    #[error("triangle {triangle} has fake id {fake_id} but only {num_components} components were configured")]
    FakeIdOutOfRange {
        /// The index of the offending triangle.
        triangle: usize,
        /// Its fake id.
        fake_id: u32,
        /// The number of configured components.
        num_components: u32,
    },
    /// A map could not be allocated.
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    /// A backend-specific failure.
    #[error("rasterization backend failure: {0}")]
    Backend(String),
}
