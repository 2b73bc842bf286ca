//! Integer lattice conventions of the model space.
//!
//! All lengths are integers in units of voxels. The voxel with coordinates
//! `(a, b, c)` occupies the open interval `(a, a + 1) × (b, b + 1) × (c, c + 1)`:
//! its coordinates name its *lower* corner, not its center.
//!
//! The model space is tiled by *boxes*: axis-aligned integer cuboids whose size
//! is the `box_size` stride of a [`ModelSpace`] and whose location is a
//! componentwise multiple of that stride. A box is always identified by the
//! location of its lower corner.

pub use self::model_space::{ceil_divide, ceil_divide_vec, ModelSpace, ModelSpaceError};

mod model_space;
