use occvox::lattice::ModelSpace;
use occvox::math::{Point, Vector};
use occvox::model_map::ModelMap;
use occvox::pipeline::RenderLimits;
use occvox::shape::CuboidComponent;
use occvox::voxelizer::{Voxelizer, VoxelizerError};
use std::sync::Arc;

#[test]
fn single_dense_box_is_one_subvolume() {
    let space = ModelSpace::new(Vector::repeat(4), Vector::repeat(4)).unwrap();
    let mut model_map = ModelMap::new(space);
    let cube = CuboidComponent::new(3, Point::new(1.0, 1.0, 1.0), Point::new(3.0, 3.0, 3.0));
    assert_eq!(model_map.insert_component(Arc::new(cube)), 1);

    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());
    let _ = voxelizer.set_whole_volume(Vector::repeat(4), 1).unwrap();
    voxelizer.set_model_map(model_map.into_shared());
    let report = voxelizer.render_all().unwrap();

    assert_eq!(report.subvolumes.len(), 1);
    let sv = &report.subvolumes[0];
    assert_eq!(sv.corner, Point::origin());
    assert_eq!(sv.size, Vector::repeat(4));
    assert_eq!(sv.components.iter().copied().collect::<Vec<_>>(), [3]);
    assert_eq!(voxelizer.render_state(), &[1]);
}

#[test]
fn region_at_an_offset_only_writes_its_boxes() {
    let space = ModelSpace::new(Vector::repeat(4), Vector::new(8, 4, 4)).unwrap();
    let mut model_map = ModelMap::new(space);
    let first = CuboidComponent::new(1, Point::new(1.0, 1.0, 1.0), Point::new(3.0, 3.0, 3.0));
    let second = CuboidComponent::new(3, Point::new(5.0, 1.0, 1.0), Point::new(7.0, 3.0, 3.0));
    assert_eq!(model_map.insert_component(Arc::new(first)), 1);
    assert_eq!(model_map.insert_component(Arc::new(second)), 1);

    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());
    let _ = voxelizer.set_whole_volume(Vector::new(8, 4, 4), 1).unwrap();
    voxelizer.set_model_map(model_map.into_shared());
    let report = voxelizer
        .render_region(&Point::new(4, 0, 0), &Vector::repeat(4))
        .unwrap();

    assert_eq!(report.subvolumes.len(), 1);
    let sv = &report.subvolumes[0];
    assert_eq!(sv.corner, Point::new(4, 0, 0));
    assert_eq!(sv.size, Vector::repeat(4));
    assert_eq!(sv.grid_corner, Point::origin());
    assert_eq!(sv.components.iter().copied().collect::<Vec<_>>(), [3]);
    assert_eq!(voxelizer.render_state(), &[1]);

    let occmap = voxelizer.occmap();
    let k = occmap.num_alpha_bits();
    for z in 0..4 {
        for y in 0..4 {
            for x in 0..8 {
                let overlap = occmap.at(x, y, z, 0);
                let covered = (5..7).contains(&x) && (1..3).contains(&y) && (1..3).contains(&z);
                if covered {
                    assert_eq!(overlap.id(k), 3);
                    assert_eq!(overlap.alpha(k), 1);
                } else {
                    assert!(overlap.is_empty(), "voxel ({x}, {y}, {z}) was written");
                }
            }
        }
    }
}

#[test]
fn empty_model_is_batched_into_one_subvolume() {
    let space = ModelSpace::new(Vector::repeat(2), Vector::new(8, 4, 4)).unwrap();
    let model_map = ModelMap::new(space);

    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());
    let _ = voxelizer.set_whole_volume(Vector::new(8, 4, 4), 1).unwrap();
    voxelizer.set_model_map(model_map.into_shared());
    let report = voxelizer.render_all().unwrap();

    assert_eq!(report.subvolumes.len(), 1);
    assert_eq!(report.num_boxes(), 16);
    assert_eq!(report.subvolumes[0].num_boxes, Vector::new(4, 2, 2));
    assert!(report.subvolumes[0].components.is_empty());
    assert!(voxelizer.occmap().data().iter().all(|o| o.is_empty()));
}

#[test]
fn texel_budget_forces_single_boxes() {
    // One box needs 4 * 4 * 1 words, growing along Z needs a second slab.
    let space = ModelSpace::new(Vector::new(4, 4, 32), Vector::new(8, 8, 64)).unwrap();
    let mut model_map = ModelMap::new(space);
    let slab = CuboidComponent::new(1, Point::origin(), Point::new(8.0, 8.0, 64.0));
    assert_eq!(model_map.insert_component(Arc::new(slab)), 8);

    let mut voxelizer = Voxelizer::cpu(RenderLimits {
        max_slicemap_texels: 16,
        ..RenderLimits::default()
    });
    let _ = voxelizer.set_whole_volume(Vector::new(8, 8, 64), 1).unwrap();
    voxelizer.set_model_map(model_map.into_shared());
    let report = voxelizer.render_all().unwrap();

    assert_eq!(report.subvolumes.len(), 8);
    let first = &report.subvolumes[0];
    assert_eq!(first.grid_corner, Point::origin());
    assert_eq!(first.size, Vector::new(4, 4, 32));
    assert!(report
        .subvolumes
        .iter()
        .all(|sv| sv.num_boxes == Vector::repeat(1)));

    let occmap = voxelizer.occmap();
    let k = occmap.num_alpha_bits();
    for z in 0..64 {
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(occmap.at(x, y, z, 0).id(k), 1);
                assert_eq!(occmap.at(x, y, z, 0).alpha(k), 1);
                assert!(occmap.at(x, y, z, 1).is_empty());
            }
        }
    }
    assert!(voxelizer.check_slot_counts().is_empty());
}

#[test]
fn oversized_box_aborts_the_render() {
    let space = ModelSpace::new(Vector::repeat(4), Vector::repeat(4)).unwrap();
    let mut model_map = ModelMap::new(space);
    for id in 0..2 {
        let cube = CuboidComponent::new(id, Point::new(1.0, 1.0, 1.0), Point::new(3.0, 3.0, 3.0));
        let _ = model_map.insert_component(Arc::new(cube));
    }

    let mut voxelizer = Voxelizer::cpu(RenderLimits {
        max_slicemap_texels: 31,
        ..RenderLimits::default()
    });
    let _ = voxelizer.set_whole_volume(Vector::repeat(4), 1).unwrap();
    voxelizer.set_model_map(model_map.into_shared());

    assert!(matches!(
        voxelizer.render_all(),
        Err(VoxelizerError::BoxTooLarge {
            num_components: 2,
            ..
        })
    ));
}

#[test]
fn configuration_is_checked_before_rendering() {
    let space = ModelSpace::new(Vector::repeat(4), Vector::repeat(4)).unwrap();
    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());

    assert_eq!(
        voxelizer.render_all(),
        Err(VoxelizerError::MissingWholeVolume)
    );
    assert_eq!(
        voxelizer.set_whole_volume(Vector::repeat(4), 0),
        Err(VoxelizerError::InvalidMagnification(0))
    );
    assert!(matches!(
        voxelizer.set_whole_volume(Vector::new(4096, 4, 4), 1),
        Err(VoxelizerError::InvalidVolume { .. })
    ));

    // Too many slots are clamped to what fits along X.
    assert_eq!(
        voxelizer.set_whole_volume_with_slots(Vector::repeat(4), 1, 10_000),
        Ok(512)
    );
    assert_eq!(voxelizer.occmap().num_slots(), 512);
    assert_eq!(voxelizer.set_whole_volume(Vector::repeat(16), 2), Ok(128));
    assert_eq!(
        voxelizer.render_all(),
        Err(VoxelizerError::MissingModelMap)
    );

    let mut model_map = ModelMap::new(space.with_size(Vector::repeat(16)).unwrap());
    let _ = model_map.insert(Point::new(4, 0, 0), 12);
    voxelizer.set_model_map(model_map.into_shared());
    assert_eq!(
        voxelizer.render_all(),
        Err(VoxelizerError::UnknownComponent(12))
    );
}

#[test]
fn ids_must_fit_next_to_the_alpha_bits() {
    let space = ModelSpace::new(Vector::repeat(4), Vector::repeat(4)).unwrap();
    let mut model_map = ModelMap::new(space);
    let _ = model_map.insert(Point::origin(), u32::MAX);

    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());
    // 8 alpha levels need 4 bits, leaving 28 bits for the id.
    let _ = voxelizer.set_whole_volume(Vector::repeat(4), 2).unwrap();
    voxelizer.set_model_map(model_map.into_shared());

    assert_eq!(
        voxelizer.render_all(),
        Err(VoxelizerError::ComponentIdOverflow {
            id: u32::MAX,
            max_id: (1 << 28) - 1,
        })
    );
}
