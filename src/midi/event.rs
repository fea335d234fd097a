//! Event-by-event walk over a track chunk.
//!
//! Events have no fixed size: channel messages take one or two data bytes,
//! SysEx runs until its `0xF7` terminator and meta events carry their own
//! length. The walk also has to honour running status, where a data byte
//! in event position reuses the previous event byte. [`EventStream`] keeps
//! that state and yields the byte offsets of every data field so a caller
//! can rewrite values in place without moving any boundary.

use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::midi::chunk::TRACK_HEADER_LEN;
use crate::midi::vlq;

pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;
pub const META: u8 = 0xFF;

/// Channel voice message with the buffer offsets of its data bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceMessage {
    NoteOff { key: usize, velocity: usize },
    NoteOn { key: usize, velocity: usize },
    PolyAftertouch { key: usize, pressure: usize },
    ControlChange { controller: usize, value: usize },
    ProgramChange { program: usize },
    ChannelPressure { pressure: usize },
    PitchBend { lsb: usize, msb: usize },
}

impl VoiceMessage {
    /// Offset of the note number for note off, note on and aftertouch.
    pub fn key(&self) -> Option<usize> {
        match *self {
            VoiceMessage::NoteOff { key, .. }
            | VoiceMessage::NoteOn { key, .. }
            | VoiceMessage::PolyAftertouch { key, .. } => Some(key),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    ChannelVoice { channel: u8, message: VoiceMessage },
    SystemExclusive,
    /// Meta events are skipped whole; only the type is reported.
    Meta { meta_type: u8 },
}

/// One decoded event. Offsets index the track chunk the stream walks, so
/// they are only meaningful for that buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackEvent {
    /// Ticks since the previous event. Informational, never rewritten.
    pub delta_time: u32,
    /// Position of the event byte, or of the first data byte under running status.
    pub offset: usize,
    pub kind: EventKind,
}

/// Cursor over one track chunk.
///
/// The stream does not hold the buffer, so the caller may mutate data bytes
/// between calls to [`EventStream::next_event`]. Rewriting a data byte never
/// changes where the next event starts.
#[derive(Clone, Debug)]
pub struct EventStream {
    track: usize,
    position: usize,
    previous_event: u8,
    halted: bool,
}

impl EventStream {
    /// Start right after the `MTrk` header of track `track` (zero-based).
    pub fn new(track: usize) -> Self {
        EventStream {
            track,
            position: TRACK_HEADER_LEN,
            previous_event: 0x00,
            halted: false,
        }
    }

    fn malformed(&self, offset: usize, context: &'static str) -> DecodeError {
        DecodeError::MalformedStream {
            track: self.track,
            offset,
            context,
        }
    }

    fn byte_at(&self, buf: &[u8], offset: usize, context: &'static str) -> Result<u8, DecodeError> {
        buf.get(offset)
            .copied()
            .ok_or_else(|| self.malformed(offset, context))
    }

    /// Offset `pos` and the `count - 1` bytes after it must all be in `buf`.
    fn data_bytes(
        &self,
        buf: &[u8],
        pos: usize,
        count: usize,
        context: &'static str,
    ) -> Result<(), DecodeError> {
        if pos + count > buf.len() {
            return Err(self.malformed(buf.len().max(pos), context));
        }
        Ok(())
    }

    /// Decode the event at the cursor and step past it.
    ///
    /// Returns `Ok(None)` once the cursor reaches the end of `buf`. After an
    /// error the stream is exhausted and keeps returning `Ok(None)`.
    pub fn next_event(&mut self, buf: &[u8]) -> Result<Option<TrackEvent>, DecodeError> {
        if self.halted || self.position >= buf.len() {
            return Ok(None);
        }
        let result = self.step(buf);
        if result.is_err() {
            self.halted = true;
        }
        result.map(Some)
    }

    fn step(&mut self, buf: &[u8]) -> Result<TrackEvent, DecodeError> {
        let mut pos = self.position;
        let (delta_time, delta_len) =
            vlq::decode(buf, pos).ok_or_else(|| self.malformed(pos, "delta time"))?;
        pos += delta_len;

        let offset = pos;
        let first = self.byte_at(buf, pos, "event")?;
        let event_byte = if first & 0x80 != 0 {
            pos += 1;
            first
        } else {
            self.previous_event
        };

        let (kind, carried) = match event_byte {
            SYSEX_START => {
                debug!("Attempting SysEx at byte {} of track {}", offset, self.track + 1);
                // The byte right after 0xF0 is never taken as the terminator.
                loop {
                    pos += 1;
                    if self.byte_at(buf, pos, "sysex")? == SYSEX_END {
                        break;
                    }
                }
                pos += 1;
                (EventKind::SystemExclusive, SYSEX_END)
            }
            META => {
                let meta_type = self.byte_at(buf, pos, "meta event")?;
                pos += 1;
                let (length, length_len) = vlq::decode(buf, pos)
                    .ok_or_else(|| self.malformed(pos, "meta event length"))?;
                pos += length_len + length as usize;
                (EventKind::Meta { meta_type }, META)
            }
            _ => {
                let instruction = event_byte >> 4;
                let channel = event_byte & 0x0F;
                let message = match instruction {
                    0x8 | 0x9 | 0xA => {
                        self.data_bytes(buf, pos, 2, "note event")?;
                        let (key, second) = (pos, pos + 1);
                        pos += 2;
                        match instruction {
                            0x8 => VoiceMessage::NoteOff { key, velocity: second },
                            0x9 => VoiceMessage::NoteOn { key, velocity: second },
                            _ => VoiceMessage::PolyAftertouch { key, pressure: second },
                        }
                    }
                    0xB => {
                        self.data_bytes(buf, pos, 2, "control change")?;
                        let message = VoiceMessage::ControlChange {
                            controller: pos,
                            value: pos + 1,
                        };
                        pos += 2;
                        message
                    }
                    0xC | 0xD => {
                        self.data_bytes(buf, pos, 1, "channel message")?;
                        let message = if instruction == 0xC {
                            VoiceMessage::ProgramChange { program: pos }
                        } else {
                            VoiceMessage::ChannelPressure { pressure: pos }
                        };
                        pos += 1;
                        message
                    }
                    0xE => {
                        self.data_bytes(buf, pos, 2, "pitch bend")?;
                        let message = VoiceMessage::PitchBend { lsb: pos, msb: pos + 1 };
                        pos += 2;
                        message
                    }
                    _ => {
                        return Err(DecodeError::InvalidInstruction {
                            track: self.track,
                            offset,
                            instruction,
                        })
                    }
                };
                (EventKind::ChannelVoice { channel, message }, event_byte)
            }
        };

        trace!(track = self.track + 1, offset, delta_time, ?kind, "event");
        self.position = pos;
        self.previous_event = carried;
        Ok(TrackEvent {
            delta_time,
            offset,
            kind,
        })
    }
}

/// Read-only iterator over the events of one track chunk.
pub struct Events<'a> {
    buf: &'a [u8],
    stream: EventStream,
}

impl<'a> Events<'a> {
    pub fn new(buf: &'a [u8], track: usize) -> Self {
        Events {
            buf,
            stream: EventStream::new(track),
        }
    }
}

impl Iterator for Events<'_> {
    type Item = Result<TrackEvent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.next_event(self.buf).transpose()
    }
}
