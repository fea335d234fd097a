use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

/// Output name used when none is given: `song.mid` becomes
/// `song (flipped).mid`, or `song (flipped, octaves kept).mid` when octave
/// preservation is on. An input without an extension gets `.mid`.
pub fn derive_output_path(input: &Path, preserve_octaves: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    let mut name = stem;
    name.push(if preserve_octaves {
        " (flipped, octaves kept)"
    } else {
        " (flipped)"
    });
    name.push(".");
    name.push(input.extension().unwrap_or_else(|| "mid".as_ref()));
    input.with_file_name(name)
}

/// Whether `input` and `output` name the same file.
pub fn is_same_file(input: &Path, output: &Path) -> bool {
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    }
}

/// Write `bytes` to `path`.
///
/// With `in_place`, the bytes go to a temporary file next to `path` first and
/// replace it only once completely written.
pub fn write_output(path: &Path, bytes: &[u8], in_place: bool) -> io::Result<()> {
    if !in_place {
        fs::write(path, bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        return Ok(());
    }

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    debug!("Replacing {} via {}", path.display(), temp.path().display());
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
