pub mod input;
pub mod output;

use std::path::Path;

use tracing::info;

use crate::error::FileError;
use crate::TransformReport;

/// Read `input`, flip it and write the result to `output`.
///
/// The output is only touched once every track has been transformed, so a
/// parse or fatal decode error leaves `output` exactly as it was. When
/// `output` names the input file it is replaced through a temporary file.
pub fn flip_file(input: &Path, output: &Path, preserve_octaves: bool) -> Result<TransformReport, FileError> {
    let bytes = input::read_input(input).map_err(|source| FileError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let mut midi = crate::parse(&bytes).map_err(|source| FileError::Parse {
        path: input.to_path_buf(),
        source,
    })?;
    info!(
        "format {}, {} tracks, division {}",
        midi.format_type, midi.track_count, midi.time_division
    );

    let report = crate::transform(&mut midi, preserve_octaves).map_err(|source| FileError::Flip {
        path: input.to_path_buf(),
        source,
    })?;

    let in_place = output::is_same_file(input, output);
    output::write_output(output, &crate::serialize(&midi), in_place).map_err(|source| {
        FileError::Write {
            path: output.to_path_buf(),
            source,
        }
    })?;
    Ok(report)
}
