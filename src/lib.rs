//! Mirror the pitches of a Standard MIDI File.
//!
//! Every note number is reflected across the 0..=127 range, together with
//! pitch bends and coarse/fine tuning data entry. Optionally each channel
//! is moved back by whole octaves so it stays near its original register.
//! Only data byte values change, so the output is the input with some bytes
//! rewritten and nothing moved.
//!
//! ```no_run
//! let bytes = std::fs::read("song.mid")?;
//! let mut midi = midi_flipper::parse(&bytes)?;
//! let report = midi_flipper::transform(&mut midi, true)?;
//! for track in &report.tracks {
//!     if let Some(err) = &track.halted {
//!         eprintln!("{}", err);
//!     }
//! }
//! std::fs::write("song (flipped, octaves kept).mid", midi_flipper::serialize(&midi))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod general;
pub mod io;
pub mod midi;

pub use config::Config;
pub use error::{ConfigError, DecodeError, FileError};
pub use general::transpose::TrackReport;
pub use midi::{MidiFile, Track};

use general::analyze::analyze_track;
use general::transpose::transpose_track;

/// Per-track outcome of [`transform`], in track order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformReport {
    pub tracks: Vec<TrackReport>,
}

impl TransformReport {
    /// Tracks that stopped early on an invalid instruction.
    pub fn halted(&self) -> impl Iterator<Item = &TrackReport> {
        self.tracks.iter().filter(|t| t.halted.is_some())
    }
}

/// Validate the header and split `bytes` into track buffers.
pub fn parse(bytes: &[u8]) -> Result<MidiFile, DecodeError> {
    midi::chunk::parse(bytes)
}

/// Mirror the pitches of every track in place.
///
/// All tracks are analysed before any is rewritten, so a malformed stream
/// is reported with `file` still untouched. An invalid instruction only
/// stops its own track and is recorded in that track's report.
pub fn transform(file: &mut MidiFile, preserve_octaves: bool) -> Result<TransformReport, DecodeError> {
    let analyses = file
        .tracks
        .iter()
        .enumerate()
        .map(|(index, track)| analyze_track(track.as_bytes(), index))
        .collect::<Result<Vec<_>, _>>()?;

    let mut tracks = Vec::with_capacity(file.tracks.len());
    for (index, (track, analysis)) in file.tracks.iter_mut().zip(&analyses).enumerate() {
        let report = transpose_track(track, index, &analysis.octave_shifts, preserve_octaves)?;
        tracks.push(report);
    }
    Ok(TransformReport { tracks })
}

/// Header followed by every track chunk, byte for byte.
pub fn serialize(file: &MidiFile) -> Vec<u8> {
    file.to_bytes()
}
