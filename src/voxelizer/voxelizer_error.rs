use crate::occupancy::AllocationError;
use crate::pipeline::{PipelineError, RenderLimits};

/// Errors reported while configuring a [`Voxelizer`](super::Voxelizer) or rendering with it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum VoxelizerError {
    /// A render was requested before the whole volume was configured.
    #[error("the whole volume must be set before rendering")]
    MissingWholeVolume,
    /// A render was requested before a model map was installed.
    #[error("a model map must be set before rendering")]
    MissingModelMap,
    /// The magnification is zero.
    #[error("invalid magnification {0}")]
    InvalidMagnification(u32),
    /// The whole volume has a zero extent, or is too wide to hold a single overlap slot.
    #[error("invalid whole volume {size:?} for a maximum image extent of {max_3d_texture_dim}")]
    InvalidVolume {
        /// The requested volume size.
        size: [u32; 3],
        /// The largest image extent of the backend.
        max_3d_texture_dim: u32,
    },
    /// A single box needs a larger slicemap than the backend can produce.
    ///
    /// Shrinking the box size, the magnification or the number of components
    /// per box is required before rendering again.
    #[error("the box at {location:?} needs a slicemap of {image_size:?} for {num_components} components, exceeding {limits:?}")]
    BoxTooLarge {
        /// The location of the box, in voxels.
        location: [u32; 3],
        /// The flattened slicemap image size it needs.
        image_size: [u64; 3],
        /// The number of components overlapping it.
        num_components: usize,
        /// The limits in force.
        limits: RenderLimits,
    },
    /// A box of the model map references a component that was never registered.
    #[error("component {0} is referenced by the model map but not registered")]
    UnknownComponent(u32),
    /// A component id does not fit next to the alpha bits of an overlap record.
    #[error("component id {id} exceeds the largest storable id {max_id}")]
    ComponentIdOverflow {
        /// The offending id.
        id: u32,
        /// The largest id the occmap can store.
        max_id: u32,
    },
    /// The model map lock was poisoned by a panicking writer.
    #[error("the model map lock is poisoned")]
    PoisonedModelMap,
    /// A rasterization stage failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// A map could not be allocated.
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}
