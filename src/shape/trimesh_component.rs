use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use crate::shape::{IdMesh, WatertightComponent};

/// Error indicating that a triangle mesh component could not be built.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TriMeshComponentError {
    /// A component mesh must contain at least one triangle.
    #[error("a component mesh must contain at least one triangle")]
    EmptyIndices,
    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {vertex} but the mesh only has {num_vertices} vertices")]
    IndexOutOfBounds {
        /// The offending triangle.
        triangle: usize,
        /// The offending vertex index.
        vertex: u32,
        /// The number of vertices of the mesh.
        num_vertices: usize,
    },
}

/// A component described by an arbitrary closed triangle mesh.
///
/// The mesh is expected to be watertight: every edge shared by an even
/// number of triangles. This is not checked.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct TriMeshComponent {
    id: u32,
    vertices: Vec<Point<Real>>,
    indices: Vec<[u32; 3]>,
    aabb: Aabb,
}

impl TriMeshComponent {
    /// Creates a new mesh component from its vertex and index buffers.
    pub fn new(
        id: u32,
        vertices: Vec<Point<Real>>,
        indices: Vec<[u32; 3]>,
    ) -> Result<Self, TriMeshComponentError> {
        if indices.is_empty() {
            return Err(TriMeshComponentError::EmptyIndices);
        }

        for (triangle, idx) in indices.iter().enumerate() {
            if let Some(vertex) = idx.iter().find(|i| **i as usize >= vertices.len()) {
                return Err(TriMeshComponentError::IndexOutOfBounds {
                    triangle,
                    vertex: *vertex,
                    num_vertices: vertices.len(),
                });
            }
        }

        let aabb = Aabb::from_points(vertices.iter().copied());

        Ok(Self {
            id,
            vertices,
            indices,
            aabb,
        })
    }

    /// The vertex buffer of this mesh.
    pub fn vertices(&self) -> &[Point<Real>] {
        &self.vertices
    }

    /// The index buffer of this mesh.
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }
}

impl WatertightComponent for TriMeshComponent {
    fn id(&self) -> u32 {
        self.id
    }

    fn aabb(&self) -> Aabb {
        self.aabb
    }

    fn add_triangles_to_mesh_with_id(&self, mesh: &mut IdMesh, fake_id: u32) {
        mesh.append(&self.vertices, &self.indices, fake_id);
    }
}
