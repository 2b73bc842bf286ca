use occvox::lattice::ModelSpace;
use occvox::math::{Point, Vector};
use occvox::model_map::ModelMap;
use occvox::pipeline::RenderLimits;
use occvox::voxelizer::{ScanContext, ScanState, SubvolumeScheduler};
use oorandom::Rand32;

#[test]
fn every_box_is_scheduled_exactly_once() {
    let mut rng = Rand32::new(0x5eed_0cc5);

    for _ in 0..200 {
        let box_size = Vector::from_fn(|_, _| rng.rand_range(1..5));
        let num_boxes = Vector::from_fn(|_, _| rng.rand_range(1..7));
        let size = box_size.component_mul(&num_boxes);
        let space = ModelSpace::new(box_size, size).unwrap();

        let mut model_map = ModelMap::new(space);
        for z in 0..num_boxes.z {
            for y in 0..num_boxes.y {
                for x in 0..num_boxes.x {
                    let location = space.box_location(&Point::new(x, y, z));
                    for _ in 0..rng.rand_range(0..4) {
                        let _ = model_map.insert(location, rng.rand_range(0..10));
                    }
                }
            }
        }

        // A singleton box needs at most 4 * 4 * 3 words.
        let limits = RenderLimits {
            max_slicemap_texels: rng.rand_range(48..600) as u64,
            ..RenderLimits::default()
        };
        let ctx = ScanContext {
            model_map: &model_map,
            region_corner: Point::origin(),
            volume_size: size,
            magnification: 1,
            limits,
        };

        let mut scheduler = SubvolumeScheduler::new();
        scheduler.reset(num_boxes).unwrap();
        let mut owner = vec![0u32; (num_boxes.x * num_boxes.y * num_boxes.z) as usize];
        let mut num_subvolumes = 0;

        while let Some(sv) = scheduler.next_subvolume(&ctx).unwrap() {
            num_subvolumes += 1;
            assert_eq!(sv.id, num_subvolumes);
            assert_eq!(sv.size, box_size.component_mul(&sv.num_boxes));
            assert_eq!(sv.corner, space.box_location(&sv.grid_corner));

            let mut expected_components = Default::default();
            model_map.union_components_in_region(&sv.corner, &sv.num_boxes, &mut expected_components);
            assert_eq!(sv.components, expected_components);

            for z in 0..sv.num_boxes.z {
                for y in 0..sv.num_boxes.y {
                    for x in 0..sv.num_boxes.x {
                        let b = sv.grid_corner + Vector::new(x, y, z);
                        assert!(b.x < num_boxes.x && b.y < num_boxes.y && b.z < num_boxes.z);
                        let i = (b.x + num_boxes.x * (b.y + num_boxes.y * b.z)) as usize;
                        assert_eq!(owner[i], 0, "box {:?} scheduled twice", b);
                        owner[i] = sv.id;
                    }
                }
            }
        }

        assert!(owner.iter().all(|id| *id > 0));
        assert_eq!(scheduler.render_state(), &owner[..]);
        assert_eq!(scheduler.state(), ScanState::Done);
        assert_eq!(scheduler.next_subvolume(&ctx).unwrap(), None);
    }
}

#[test]
fn subvolumes_are_clamped_to_the_volume() {
    let space = ModelSpace::new(Vector::repeat(4), Vector::new(10, 4, 6)).unwrap();
    let model_map = ModelMap::new(space);
    let ctx = ScanContext {
        model_map: &model_map,
        region_corner: Point::origin(),
        volume_size: space.size(),
        magnification: 2,
        limits: RenderLimits::default(),
    };

    let mut scheduler = SubvolumeScheduler::new();
    scheduler.reset(space.num_boxes()).unwrap();
    let sv = scheduler.next_subvolume(&ctx).unwrap().unwrap();

    assert_eq!(sv.num_boxes, Vector::new(3, 1, 2));
    assert_eq!(sv.size, Vector::new(10, 4, 6));
    assert_eq!(scheduler.next_subvolume(&ctx).unwrap(), None);
}
