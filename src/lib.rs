/*!
occvox
========

**occvox** computes antialiased volumetric occupancy maps of large assemblies
of watertight triangle meshes.

The model space is tiled into fixed-size *boxes*. A scheduler walks the box
grid and greedily groups unrendered boxes into *subvolumes* that fit the
memory limits of the rasterization backend. Each subvolume is rasterized into
a [`Slicemap`](occupancy::Slicemap) (one Z-bitfield per component) and then
folded into the full-volume [`Occmap`](occupancy::Occmap), which stores up to
`C` `(component id, covered fraction)` records per voxel.

*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![deny(unused_results)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::module_inception)]
#![allow(clippy::manual_range_contains)] // This usually makes it way more verbose that it could be.
#![allow(clippy::type_complexity)]
#![deny(unused_qualifications)]

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

pub extern crate nalgebra as na;

pub mod bounding_volume;
pub mod lattice;
pub mod model_map;
pub mod occupancy;
pub mod pipeline;
pub mod shape;
pub mod utils;
pub mod voxelizer;

/// Aliases for mathematical types.
pub mod math {
    pub use na::{Point3, Vector3};

    /// The scalar type used for mesh coordinates.
    pub type Real = f32;

    /// The point type.
    pub use Point3 as Point;

    /// The vector type.
    pub use Vector3 as Vector;
}
