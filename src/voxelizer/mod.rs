//! Scheduling and rendering of subvolumes.

pub use self::subvolume_scheduler::{
    GrowthAxes, ScanContext, ScanState, Subvolume, SubvolumeScheduler,
};
pub use self::voxelizer::{RenderReport, Voxelizer};
pub use self::voxelizer_error::VoxelizerError;

mod subvolume_scheduler;
mod voxelizer;
mod voxelizer_error;
