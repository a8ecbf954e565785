use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use crate::error::{DmcError, Result};

/// Size of the file at `path` in bytes.
pub fn file_size(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    std::fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| DmcError::FileAccess {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a binary file using memory mapping for improved performance
/// This is more efficient for large files as it doesn't load the entire file into RAM
pub fn read_binary_file_mmap(path: impl AsRef<Path>) -> Result<Mmap> {
    let path = path.as_ref();
    let access = |source: std::io::Error| DmcError::FileAccess {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(access)?;
    // Safety: recordings are treated as immutable; nothing in this crate writes to them
    unsafe { Mmap::map(&file) }.map_err(access)
}
