//! Axis Aligned Bounding Box.

use crate::math::{Point, Real, Vector};

/// An Axis-Aligned Bounding Box (AABB) in model space.
///
/// Model-space coordinates are expressed in voxels: the voxel with integer
/// coordinates `(a, b, c)` spans `(a, a + 1) × (b, b + 1) × (c, c + 1)`.
///
/// # Example
///
/// ```rust
/// use occvox::bounding_volume::Aabb;
/// use nalgebra::Point3;
///
/// let aabb = Aabb::from_points([
///     Point3::new(1.0, 2.0, 3.0),
///     Point3::new(-1.0, 4.0, 2.0),
///     Point3::new(0.0, 0.0, 5.0),
/// ]);
///
/// assert_eq!(aabb.mins, Point3::new(-1.0, 0.0, 2.0));
/// assert_eq!(aabb.maxs, Point3::new(1.0, 4.0, 5.0));
/// ```
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Copy, Clone)]
#[repr(C)]
pub struct Aabb {
    /// The point with minimum coordinates.
    pub mins: Point<Real>,
    /// The point with maximum coordinates.
    pub maxs: Point<Real>,
}

impl Aabb {
    /// Creates a new AABB from its minimum and maximum corners.
    #[inline]
    pub fn new(mins: Point<Real>, maxs: Point<Real>) -> Aabb {
        Aabb { mins, maxs }
    }

    /// Creates an invalid AABB with `mins` components set to `Real::MAX`
    /// and `maxs` components set to `-Real::MAX`.
    ///
    /// This is often used as the initial value of some AABB merging algorithms.
    #[inline]
    pub fn new_invalid() -> Self {
        Self::new(
            Vector::repeat(Real::MAX).into(),
            Vector::repeat(-Real::MAX).into(),
        )
    }

    /// Creates a new AABB that tightly encloses a set of points.
    ///
    /// Returns an invalid AABB if the iterator is empty.
    pub fn from_points<I>(pts: I) -> Self
    where
        I: IntoIterator<Item = Point<Real>>,
    {
        let mut result = Self::new_invalid();

        for pt in pts {
            result.take_point(pt);
        }

        result
    }

    /// Enlarges this AABB so it also contains the point `pt`.
    #[inline]
    pub fn take_point(&mut self, pt: Point<Real>) {
        self.mins = self.mins.coords.inf(&pt.coords).into();
        self.maxs = self.maxs.coords.sup(&pt.coords).into();
    }

    /// Returns `true` if `mins <= maxs` on every axis.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.mins.x <= self.maxs.x && self.mins.y <= self.maxs.y && self.mins.z <= self.maxs.z
    }
}
