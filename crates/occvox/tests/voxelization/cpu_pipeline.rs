use approx::assert_relative_eq;
use occvox::lattice::ModelSpace;
use occvox::math::{Point, Real, Vector};
use occvox::model_map::ModelMap;
use occvox::pipeline::RenderLimits;
use occvox::shape::{CuboidComponent, TriMeshComponent};
use occvox::voxelizer::Voxelizer;
use std::sync::Arc;

fn cube_voxelizer(
    mins: Point<Real>,
    maxs: Point<Real>,
    magnification: u32,
) -> Voxelizer<occvox::pipeline::CpuSlicemapper, occvox::pipeline::CpuOccmapper> {
    let space = ModelSpace::new(Vector::repeat(4), Vector::repeat(4)).unwrap();
    let mut model_map = ModelMap::new(space);
    let _ = model_map.insert_component(Arc::new(CuboidComponent::new(7, mins, maxs)));

    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());
    let _ = voxelizer
        .set_whole_volume(Vector::repeat(4), magnification)
        .unwrap();
    voxelizer.set_model_map(model_map.into_shared());
    let _ = voxelizer.render_all().unwrap();
    voxelizer
}

#[test]
fn aligned_cube_covers_whole_voxels() {
    let voxelizer = cube_voxelizer(Point::new(1.0, 1.0, 1.0), Point::new(3.0, 3.0, 3.0), 1);
    let occmap = voxelizer.occmap();
    let k = occmap.num_alpha_bits();
    assert_eq!(occmap.denominator(), 1);

    for z in 0..4 {
        for y in 0..4 {
            for x in 0..4 {
                let inside = [x, y, z].iter().all(|c| (1..3).contains(c));
                let record = occmap.at(x, y, z, 0);
                if inside {
                    assert_eq!(record.id(k), 7);
                    assert_eq!(record.alpha(k), 1);
                } else {
                    assert!(record.is_empty(), "({}, {}, {})", x, y, z);
                }
                assert_eq!(voxelizer.slot_counts().at(x, y, z), inside as u32);
            }
        }
    }
}

#[test]
fn unaligned_cube_is_antialiased() {
    let voxelizer = cube_voxelizer(Point::new(0.5, 0.5, 0.5), Point::new(2.5, 2.5, 2.5), 2);
    let occmap = voxelizer.occmap();
    let k = occmap.num_alpha_bits();
    assert_eq!(occmap.denominator(), 8);

    // Each native voxel holds 2 super-samples per axis, of which 1, 2, 1, 0
    // are inside along each axis.
    let per_axis = [1, 2, 1, 0];
    for z in 0..4 {
        for y in 0..4 {
            for x in 0..4 {
                let alpha = per_axis[x as usize] * per_axis[y as usize] * per_axis[z as usize];
                assert_eq!(occmap.at(x, y, z, 0).alpha(k), alpha, "({}, {}, {})", x, y, z);
                if alpha > 0 {
                    assert_eq!(occmap.at(x, y, z, 0).id(k), 7);
                }
            }
        }
    }

    assert_relative_eq!(occmap.fraction(1, 1, 1, 0), 1.0);
    assert_relative_eq!(occmap.fraction(0, 1, 1, 0), 0.5);
    assert_relative_eq!(occmap.fraction(0, 0, 0, 0), 0.125);
}

#[test]
fn overlapping_components_use_separate_slots() {
    let space = ModelSpace::new(Vector::repeat(4), Vector::repeat(4)).unwrap();
    let mut model_map = ModelMap::new(space);
    let first = CuboidComponent::new(1, Point::new(0.0, 0.0, 0.0), Point::new(2.0, 2.0, 2.0));
    let second = CuboidComponent::new(2, Point::new(1.0, 1.0, 1.0), Point::new(3.0, 3.0, 3.0));
    let _ = model_map.insert_component(Arc::new(first));
    let _ = model_map.insert_component(Arc::new(second));

    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());
    let _ = voxelizer
        .set_whole_volume_with_slots(Vector::repeat(4), 1, 2)
        .unwrap();
    voxelizer.set_model_map(model_map.into_shared());
    let _ = voxelizer.render_all().unwrap();

    let occmap = voxelizer.occmap();
    let k = occmap.num_alpha_bits();
    assert_eq!(occmap.at(0, 0, 0, 0).id(k), 1);
    assert!(occmap.at(0, 0, 0, 1).is_empty());
    assert_eq!(occmap.at(2, 2, 2, 0).id(k), 2);
    assert_eq!(occmap.at(1, 1, 1, 0).id(k), 1);
    assert_eq!(occmap.at(1, 1, 1, 1).id(k), 2);
    assert_eq!(voxelizer.slot_counts().at(1, 1, 1), 2);
    assert!(voxelizer.check_slot_counts().is_empty());
}

#[test]
fn exhausted_slots_are_reported() {
    let space = ModelSpace::new(Vector::repeat(4), Vector::repeat(4)).unwrap();
    let mut model_map = ModelMap::new(space);
    let first = CuboidComponent::new(1, Point::new(0.0, 0.0, 0.0), Point::new(2.0, 2.0, 2.0));
    let second = CuboidComponent::new(2, Point::new(1.0, 1.0, 1.0), Point::new(3.0, 3.0, 3.0));
    let _ = model_map.insert_component(Arc::new(first));
    let _ = model_map.insert_component(Arc::new(second));

    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());
    let _ = voxelizer
        .set_whole_volume_with_slots(Vector::repeat(4), 1, 1)
        .unwrap();
    voxelizer.set_model_map(model_map.into_shared());
    let _ = voxelizer.render_all().unwrap();

    let overflows = voxelizer.check_slot_counts();
    assert_eq!(overflows.len(), 1);
    assert_eq!(overflows[0].voxel, Point::new(1, 1, 1));
    assert_eq!(overflows[0].count, 2);
    assert_eq!(overflows[0].ids, [1]);
}

#[test]
fn tetrahedron_mesh_is_voxelized() {
    // A right tetrahedron with legs of 4 voxels along each axis.
    let vertices = vec![
        Point::new(0.0, 0.0, 0.0),
        Point::new(4.0, 0.0, 0.0),
        Point::new(0.0, 4.0, 0.0),
        Point::new(0.0, 0.0, 4.0),
    ];
    let indices = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
    let tetra = TriMeshComponent::new(5, vertices, indices).unwrap();

    let space = ModelSpace::new(Vector::repeat(4), Vector::repeat(4)).unwrap();
    let mut model_map = ModelMap::new(space);
    let _ = model_map.insert_component(Arc::new(tetra));

    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());
    let _ = voxelizer.set_whole_volume(Vector::repeat(4), 1).unwrap();
    voxelizer.set_model_map(model_map.into_shared());
    let _ = voxelizer.render_all().unwrap();

    let occmap = voxelizer.occmap();
    let k = occmap.num_alpha_bits();
    for z in 0..4u32 {
        for y in 0..4u32 {
            for x in 0..4u32 {
                // The voxel center lies inside iff its coordinates sum to less than 4.
                let inside = (x + y + z) as Real + 1.5 < 4.0;
                assert_eq!(occmap.at(x, y, z, 0).alpha(k), inside as u32, "({}, {}, {})", x, y, z);
            }
        }
    }
}
