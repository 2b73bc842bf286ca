use occvox::lattice::ModelSpace;
use occvox::math::{Point, Vector};
use occvox::model_map::ModelMap;
use occvox::pipeline::RenderLimits;
use occvox::shape::CuboidComponent;
use occvox::voxelizer::Voxelizer;
use std::path::PathBuf;
use std::sync::Arc;

fn dump_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("occvox-{}-{}.raw", name, std::process::id()))
}

fn read_words(path: &PathBuf) -> Vec<u32> {
    let bytes = std::fs::read(path).unwrap();
    std::fs::remove_file(path).unwrap();
    assert_eq!(bytes.len() % 4, 0);
    bytes
        .chunks_exact(4)
        .map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]))
        .collect()
}

#[test]
fn dumps_are_the_memory_image() {
    let space = ModelSpace::new(Vector::repeat(2), Vector::new(4, 2, 2)).unwrap();
    let mut model_map = ModelMap::new(space);
    let cube = CuboidComponent::new(9, Point::new(3.0, 0.0, 1.0), Point::new(4.0, 1.0, 2.0));
    let _ = model_map.insert_component(Arc::new(cube));

    let mut voxelizer = Voxelizer::cpu(RenderLimits::default());
    let _ = voxelizer
        .set_whole_volume_with_slots(Vector::new(4, 2, 2), 1, 3)
        .unwrap();
    voxelizer.set_model_map(model_map.into_shared());
    let _ = voxelizer.render_all().unwrap();

    let occmap_path = dump_path("occmap");
    voxelizer.write_occmap(&occmap_path).unwrap();
    let words = read_words(&occmap_path);
    assert_eq!(words.len(), 4 * 2 * 2 * 3);

    // Voxel (3, 0, 1) of slot 0 is word 3 + 4 * (0 + 2 * 1).
    let k = voxelizer.occmap().num_alpha_bits();
    let expected = (9 << k) | 1;
    for (i, word) in words.iter().enumerate() {
        assert_eq!(*word, if i == 11 { expected } else { 0 }, "word {}", i);
    }

    let counts_path = dump_path("slot-counts");
    voxelizer.write_slot_counts(&counts_path).unwrap();
    let counts = read_words(&counts_path);
    assert_eq!(counts, voxelizer.slot_counts().data());
    assert_eq!(counts.iter().sum::<u32>(), 1);
    assert_eq!(counts[11], 1);
}
