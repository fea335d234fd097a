use tracing::{debug, warn};

use crate::error::{DecodeError, HexBytes};
use crate::midi::{MidiFile, Track};

/// `MThd` followed by the header length, which is always 6.
pub const HEADER_MAGIC: [u8; 8] = [b'M', b'T', b'h', b'd', 0x00, 0x00, 0x00, 0x06];

/// Magic of every track chunk.
pub const TRACK_MAGIC: [u8; 4] = [b'M', b'T', b'r', b'k'];

/// Size of the file header including its magic and length.
pub const FILE_HEADER_LEN: usize = 14;

/// Size of a track chunk's magic and length.
pub const TRACK_HEADER_LEN: usize = 8;

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Validate the file header and read format, track count and time division.
///
/// The returned file has no tracks yet.
pub fn parse_header(bytes: &[u8]) -> Result<MidiFile, DecodeError> {
    let magic = &bytes[..bytes.len().min(HEADER_MAGIC.len())];
    if magic != HEADER_MAGIC {
        return Err(DecodeError::InvalidHeader {
            expected: HexBytes(HEADER_MAGIC.to_vec()),
            actual: HexBytes::from(magic),
        });
    }
    if bytes.len() < FILE_HEADER_LEN {
        return Err(DecodeError::Truncated {
            track: None,
            needed: FILE_HEADER_LEN,
            available: bytes.len(),
        });
    }
    Ok(MidiFile {
        format_type: be_u16(&bytes[8..10]),
        track_count: be_u16(&bytes[10..12]),
        time_division: be_u16(&bytes[12..14]),
        tracks: Vec::new(),
    })
}

/// Read the track chunk at the front of `stream` and advance `stream` past it.
///
/// The chunk header is kept in the track buffer so it can be written back
/// unchanged.
pub fn parse_track(stream: &mut &[u8], index: usize) -> Result<Track, DecodeError> {
    let input = *stream;
    let magic = &input[..input.len().min(TRACK_MAGIC.len())];
    if magic != TRACK_MAGIC {
        return Err(DecodeError::InvalidTrackHeader {
            track: index,
            expected: HexBytes(TRACK_MAGIC.to_vec()),
            actual: HexBytes::from(magic),
        });
    }
    if input.len() < TRACK_HEADER_LEN {
        return Err(DecodeError::Truncated {
            track: Some(index),
            needed: TRACK_HEADER_LEN,
            available: input.len(),
        });
    }

    let length = be_u32(&input[4..8]);
    if length & 0x8000_0000 != 0 {
        return Err(DecodeError::UnsupportedTrackSize { track: index, length });
    }

    let total = TRACK_HEADER_LEN + length as usize;
    if input.len() < total {
        return Err(DecodeError::Truncated {
            track: Some(index),
            needed: total,
            available: input.len(),
        });
    }

    let (chunk, rest) = input.split_at(total);
    *stream = rest;
    debug!("Track {} read ({} bytes)", index + 1, length);
    Ok(Track::from_chunk(chunk.to_vec()))
}

/// Split a complete file into its header record and raw track buffers.
pub fn parse(bytes: &[u8]) -> Result<MidiFile, DecodeError> {
    let mut file = parse_header(bytes)?;
    let mut stream = &bytes[FILE_HEADER_LEN..];
    file.tracks.reserve(file.track_count as usize);
    for index in 0..file.track_count as usize {
        let track = parse_track(&mut stream, index)?;
        file.tracks.push(track);
    }
    if !stream.is_empty() {
        warn!("Ignoring {} bytes after the last track", stream.len());
    }
    Ok(file)
}
