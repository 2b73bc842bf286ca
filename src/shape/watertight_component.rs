use crate::bounding_volume::Aabb;
use crate::shape::IdMesh;
use std::sync::Arc;

/// A closed, non-self-intersecting surface whose interior is to be voxelized.
///
/// A component has a stable *true* id. During a render pass it may be drawn
/// under a small per-pass *fake* id instead, which indexes its channel in
/// the slicemap of that pass.
pub trait WatertightComponent: Send + Sync {
    /// The true id of this component.
    fn id(&self) -> u32;

    /// The model-space bounding box of this component.
    fn aabb(&self) -> Aabb;

    /// Appends the triangles of this component to `mesh`, tagged with `fake_id`.
    fn add_triangles_to_mesh_with_id(&self, mesh: &mut IdMesh, fake_id: u32);

    /// Appends the triangles of this component to `mesh`, tagged with its true id.
    fn add_triangles_to_mesh(&self, mesh: &mut IdMesh) {
        self.add_triangles_to_mesh_with_id(mesh, self.id())
    }
}

/// A component shared between a model map and the voxelizer.
pub type SharedComponent = Arc<dyn WatertightComponent>;
