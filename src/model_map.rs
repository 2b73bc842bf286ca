//! The index of which components overlap which render boxes.

use crate::lattice::ModelSpace;
use crate::math::{Point, Vector};
use crate::shape::SharedComponent;
use crate::utils::hashmap::HashMap;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

/// A set of true component ids.
///
/// Iteration order is ascending id order, which makes fake-id assignment
/// reproducible from one run to the next.
pub type ComponentSet = BTreeSet<u32>;

/// A model map shared between its owner and a [`Voxelizer`](crate::voxelizer::Voxelizer).
pub type SharedModelMap = Arc<RwLock<ModelMap>>;

/// Maps render-box locations to the set of components that may overlap them.
///
/// Keys are box locations, i.e. componentwise multiples of the box size of the
/// [`ModelSpace`] the map was built for. A box with no entry holds no
/// component. The map also owns the components themselves so their meshes can
/// be built when a box is rendered.
#[derive(Clone)]
pub struct ModelMap {
    model_space: ModelSpace,
    boxes: HashMap<Point<u32>, ComponentSet>,
    components: HashMap<u32, SharedComponent>,
}

impl ModelMap {
    /// Creates an empty model map over the boxes of `model_space`.
    pub fn new(model_space: ModelSpace) -> Self {
        Self {
            model_space,
            boxes: HashMap::default(),
            components: HashMap::default(),
        }
    }

    /// Wraps this map so it can be installed on a voxelizer.
    pub fn into_shared(self) -> SharedModelMap {
        Arc::new(RwLock::new(self))
    }

    /// The lattice this map is keyed on.
    #[inline]
    pub fn model_space(&self) -> &ModelSpace {
        &self.model_space
    }

    /// Registers `component` so it can be referenced by id.
    ///
    /// Returns the previously registered component with the same id, if any.
    pub fn add_component(&mut self, component: SharedComponent) -> Option<SharedComponent> {
        self.components.insert(component.id(), component)
    }

    /// Records that the component `id` overlaps the box at `box_location`.
    ///
    /// Returns `false` if it was already recorded.
    pub fn insert(&mut self, box_location: Point<u32>, id: u32) -> bool {
        debug_assert_eq!(
            self.model_space.box_containing_voxel(&box_location),
            box_location,
            "model map keys must be box locations"
        );
        self.boxes.entry(box_location).or_default().insert(id)
    }

    /// Registers `component` and records it in every box its bounding box touches.
    ///
    /// Returns the number of boxes it was recorded in, which is zero if it lies
    /// entirely outside of the model.
    pub fn insert_component(&mut self, component: SharedComponent) -> usize {
        let id = component.id();
        let range = self.model_space.boxes_overlapping_aabb(&component.aabb());
        let _ = self.add_component(component);

        let Some((mins, maxs)) = range else {
            log::debug!("component {} lies outside of the model space", id);
            return 0;
        };

        let mut all = Vec::new();
        let _ = self.model_space.boxes_in_bounding_box(&[mins, maxs], &mut all);
        for b in &all {
            let _ = self.insert(*b, id);
        }

        all.len()
    }

    /// The components recorded in the box at `box_location`.
    #[inline]
    pub fn components_in_box(&self, box_location: &Point<u32>) -> Option<&ComponentSet> {
        self.boxes.get(box_location)
    }

    /// Adds to `out` the components of every box of the region at `corner` spanning `num_boxes` boxes.
    ///
    /// `corner` must be a box location.
    pub fn union_components_in_region(
        &self,
        corner: &Point<u32>,
        num_boxes: &Vector<u32>,
        out: &mut ComponentSet,
    ) {
        let box_size = self.model_space.box_size();

        for k in 0..num_boxes.z {
            for j in 0..num_boxes.y {
                for i in 0..num_boxes.x {
                    let b = corner + Vector::new(i, j, k).component_mul(&box_size);
                    if let Some(set) = self.boxes.get(&b) {
                        out.extend(set.iter().copied());
                    }
                }
            }
        }
    }

    /// The registered component with the given true id.
    #[inline]
    pub fn component(&self, id: u32) -> Option<&SharedComponent> {
        self.components.get(&id)
    }

    /// The number of registered components.
    #[inline]
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// The number of boxes holding at least one component.
    #[inline]
    pub fn num_occupied_boxes(&self) -> usize {
        self.boxes.values().filter(|set| !set.is_empty()).count()
    }

    /// Iterates through every `(box location, components)` entry.
    pub fn iter(&self) -> impl Iterator<Item = (&Point<u32>, &ComponentSet)> {
        self.boxes.iter()
    }
}
