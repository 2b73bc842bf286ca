use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use crate::shape::{IdMesh, WatertightComponent};

/// An axis-aligned box component.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct CuboidComponent {
    id: u32,
    aabb: Aabb,
}

impl CuboidComponent {
    // Two triangles per face, indexing `Self::vertices`.
    const TRIANGLES: [[u32; 3]; 12] = [
        [4, 5, 0],
        [5, 1, 0],
        [5, 6, 1],
        [6, 2, 1],
        [6, 7, 3],
        [2, 6, 3],
        [7, 4, 0],
        [3, 7, 0],
        [0, 1, 2],
        [3, 0, 2],
        [7, 6, 5],
        [4, 7, 5],
    ];

    /// Creates the box component spanning `mins` to `maxs`.
    pub fn new(id: u32, mins: Point<Real>, maxs: Point<Real>) -> Self {
        Self {
            id,
            aabb: Aabb::new(mins, maxs),
        }
    }

    /// The eight corners of this box.
    ///
    /// The first four lie on the `mins.z` face and the last four on the
    /// `maxs.z` face, each face walked counterclockwise from its `(mins.x, mins.y)`
    /// corner.
    pub fn vertices(&self) -> [Point<Real>; 8] {
        let (a, b) = (self.aabb.mins, self.aabb.maxs);
        [
            Point::new(a.x, a.y, a.z),
            Point::new(b.x, a.y, a.z),
            Point::new(b.x, b.y, a.z),
            Point::new(a.x, b.y, a.z),
            Point::new(a.x, a.y, b.z),
            Point::new(b.x, a.y, b.z),
            Point::new(b.x, b.y, b.z),
            Point::new(a.x, b.y, b.z),
        ]
    }
}

impl WatertightComponent for CuboidComponent {
    fn id(&self) -> u32 {
        self.id
    }

    fn aabb(&self) -> Aabb {
        self.aabb
    }

    fn add_triangles_to_mesh_with_id(&self, mesh: &mut IdMesh, fake_id: u32) {
        mesh.append(&self.vertices(), &Self::TRIANGLES, fake_id);
    }
}
