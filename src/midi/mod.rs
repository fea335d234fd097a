//! Standard MIDI File model, decoding and re-encoding.

pub mod chunk;
pub mod event;
pub mod vlq;

use chunk::{HEADER_MAGIC, TRACK_HEADER_LEN};

/// A parsed Standard MIDI File. `track_count` always equals `tracks.len()`
/// once [`chunk::parse`] has returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiFile {
    pub format_type: u16,
    pub track_count: u16,
    pub time_division: u16,
    pub tracks: Vec<Track>,
}

/// One `MTrk` chunk, header included. Only payload bytes are ever rewritten
/// and never resized, so the declared length stays valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    bytes: Vec<u8>,
}

impl Track {
    pub(crate) fn from_chunk(bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.len() >= TRACK_HEADER_LEN);
        Track { bytes }
    }

    /// Full chunk: magic, length, then payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[TRACK_HEADER_LEN..]
    }

    pub fn payload_len(&self) -> usize {
        self.bytes.len() - TRACK_HEADER_LEN
    }
}

impl MidiFile {
    /// Re-emit the file: header, then every track chunk in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let tracks_len: usize = self.tracks.iter().map(|t| t.bytes.len()).sum();
        let mut out = Vec::with_capacity(chunk::FILE_HEADER_LEN + tracks_len);
        out.extend_from_slice(&HEADER_MAGIC);
        out.extend_from_slice(&self.format_type.to_be_bytes());
        out.extend_from_slice(&self.track_count.to_be_bytes());
        out.extend_from_slice(&self.time_division.to_be_bytes());
        for track in &self.tracks {
            out.extend_from_slice(&track.bytes);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reassembles_byte_exact() {
        let parts: [&[u8]; 6] = [
            &HEADER_MAGIC,
            &[0x00, 0x01, 0x00, 0x02, 0x01, 0xE0],
            b"MTrk\0\0\0\x04",
            &[0x00, 0xFF, 0x2F, 0x00],
            b"MTrk\0\0\0\x07",
            &[0x00, 0xC0, 0x05, 0x00, 0xB0, 0x07, 0x64],
        ];
        let bytes = parts.concat();
        let file = chunk::parse(&bytes).unwrap();
        assert_eq!(file.to_bytes(), bytes);
    }
}
