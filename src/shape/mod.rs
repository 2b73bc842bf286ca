//! Watertight components and the id-tagged meshes they are rasterized from.

pub use self::cuboid_component::CuboidComponent;
pub use self::id_mesh::{IdMesh, IdVertex};
pub use self::trimesh_component::{TriMeshComponent, TriMeshComponentError};
pub use self::watertight_component::{SharedComponent, WatertightComponent};

mod cuboid_component;
mod id_mesh;
mod trimesh_component;
mod watertight_component;
