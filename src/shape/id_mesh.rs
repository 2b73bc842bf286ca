use crate::math::{Point, Real};

/// A vertex tagged with the id of the component it belongs to.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct IdVertex {
    /// The model-space position.
    pub position: Point<Real>,
    /// The id of the component this vertex belongs to.
    pub id: u32,
}

impl IdVertex {
    /// Creates a new id-tagged vertex.
    #[inline]
    pub fn new(position: Point<Real>, id: u32) -> Self {
        Self { position, id }
    }
}

/// A triangle mesh whose vertices carry a small integer component id.
///
/// Rasterizers use the id of a triangle's first vertex to decide which
/// component channel it is drawn into.
#[derive(Clone, Debug, Default)]
pub struct IdMesh {
    /// The vertex buffer.
    pub verts: Vec<IdVertex>,
    /// The index buffer.
    pub tris: Vec<[u32; 3]>,
}

impl IdMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every vertex and triangle, keeping the allocated buffers.
    pub fn clear(&mut self) {
        self.verts.clear();
        self.tris.clear();
    }

    /// Is this mesh empty?
    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    /// Appends an indexed triangle set, tagging all its vertices with `id`.
    ///
    /// `indices` refer to `vertices`; they are offset to the current end of
    /// the vertex buffer.
    pub fn append(&mut self, vertices: &[Point<Real>], indices: &[[u32; 3]], id: u32) {
        let base = self.verts.len() as u32;
        self.verts
            .extend(vertices.iter().map(|pt| IdVertex::new(*pt, id)));
        self.tris
            .extend(indices.iter().map(|t| [t[0] + base, t[1] + base, t[2] + base]));
    }

    /// The three vertices of the `i`-th triangle.
    #[inline]
    pub fn triangle(&self, i: usize) -> [IdVertex; 3] {
        let t = self.tris[i];
        [
            self.verts[t[0] as usize],
            self.verts[t[1] as usize],
            self.verts[t[2] as usize],
        ]
    }
}
