use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// Read the whole input file into memory.
pub fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}
