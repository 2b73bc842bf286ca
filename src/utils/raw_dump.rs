use bytemuck::Pod;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes `words` to the file at `path`, replacing it, as their raw in-memory bytes.
///
/// No header and no padding are written: the file length is exactly
/// `size_of::<T>() * words.len()`.
pub fn write_raw_words<T: Pod>(path: impl AsRef<Path>, words: &[T]) -> io::Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(bytemuck::cast_slice(words))?;
    out.flush()?;
    log::debug!(
        "wrote {} bytes to {}",
        size_of_val(words),
        path.display()
    );
    Ok(())
}
