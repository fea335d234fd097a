use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Byte sequence rendered as `0x` followed by lowercase hex digits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl From<&[u8]> for HexBytes {
    fn from(bytes: &[u8]) -> Self {
        HexBytes(bytes.to_vec())
    }
}

/// Everything that can go wrong while decoding or walking a Standard MIDI File.
///
/// Track indices are zero-based. Offsets are byte positions inside the
/// track chunk, counting the 8-byte `MTrk` header.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid MIDI file (expected {expected}, got {actual})")]
    InvalidHeader { expected: HexBytes, actual: HexBytes },

    #[error("track {} is invalid (expected {expected}, got {actual})", .track + 1)]
    InvalidTrackHeader {
        track: usize,
        expected: HexBytes,
        actual: HexBytes,
    },

    #[error("track {} declares {length} bytes, over the maximum of {}", .track + 1, i32::MAX)]
    UnsupportedTrackSize { track: usize, length: u32 },

    #[error("track {} ends inside {context} at byte {offset}", .track + 1)]
    MalformedStream {
        track: usize,
        offset: usize,
        context: &'static str,
    },

    #[error("invalid MIDI instruction 0x{instruction:x} at byte {offset} of track {}; cannot proceed on this track", .track + 1)]
    InvalidInstruction {
        track: usize,
        offset: usize,
        instruction: u8,
    },

    #[error("{} ends early: needed {needed} bytes, {available} available", describe_location(.track))]
    Truncated {
        track: Option<usize>,
        needed: usize,
        available: usize,
    },
}

fn describe_location(track: &Option<usize>) -> String {
    match track {
        Some(t) => format!("track {}", t + 1),
        None => "file header".to_string(),
    }
}

impl DecodeError {
    /// Whether the error only stops the current track instead of the whole file.
    pub fn is_track_local(&self) -> bool {
        matches!(self, DecodeError::InvalidInstruction { .. })
    }
}

/// Problems loading the JSON configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unknown log level '{0}' (use error, warn, info, debug or trace)")]
    UnknownLogLevel(String),
}

/// Failure of a whole file run; wraps the step that went wrong and the path involved.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot read {}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {}", .path.display())]
    Parse { path: PathBuf, source: DecodeError },

    #[error("cannot flip {}", .path.display())]
    Flip { path: PathBuf, source: DecodeError },

    #[error("cannot write {}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
