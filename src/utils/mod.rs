//! Various unsorted helpers.

pub use self::raw_dump::write_raw_words;

pub mod hashmap;
mod raw_dump;
