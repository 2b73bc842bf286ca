//! A hash-map that behaves deterministically when the
//! `enhanced-determinism` feature is enabled.

/// Deterministic hashmap using [`indexmap::IndexMap`]
#[cfg(feature = "enhanced-determinism")]
pub type HashMap<K, V> = indexmap::IndexMap<
    K,
    V,
    core::hash::BuildHasherDefault<std::collections::hash_map::DefaultHasher>,
>;

/// Hashmap using [`hashbrown::HashMap`]
#[cfg(not(feature = "enhanced-determinism"))]
pub type HashMap<K, V> = hashbrown::hash_map::HashMap<K, V>;
