use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::general::analyze::{CHANNELS, PERCUSSION_CHANNEL};
use crate::midi::event::{EventKind, EventStream, VoiceMessage};
use crate::midi::Track;

pub const DATA_ENTRY_MSB: u8 = 0x06;
pub const DATA_ENTRY_LSB: u8 = 0x26;
pub const RPN_LSB: u8 = 0x64;
pub const RPN_MSB: u8 = 0x65;

/// Shifts of this size are treated as noise and never applied.
const IGNORED_SHIFT: i8 = 11;

/// Reflect a note number across the 0..=127 range.
pub fn mirror_note(note: u8) -> u8 {
    note ^ 0x7F
}

/// Reflect a 14-bit pitch bend split into its two data bytes.
pub fn mirror_pitch_bend(lsb: u8, msb: u8) -> (u8, u8) {
    let value = (((msb & 0x7F) as u16) << 7) | (lsb & 0x7F) as u16;
    let mirrored = value ^ 0x3FFF;
    ((mirrored & 0x7F) as u8, ((mirrored >> 7) & 0x7F) as u8)
}

/// Move a note by whole octaves, wrapping like an 8-bit register and then
/// dropping octaves until the top bit is clear again.
pub fn shift_octaves(note: u8, octaves: i8) -> u8 {
    let mut shifted = (note as i32 + 12 * octaves as i32) as u8;
    while shifted & 0x80 != 0 {
        shifted = shifted.wrapping_sub(12);
    }
    shifted
}

/// Registered parameter number selected by controllers 0x65 / 0x64.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RpnRegister {
    pub msb: u8,
    pub lsb: u8,
}

impl RpnRegister {
    pub fn value(&self) -> u16 {
        (((self.msb & 0x7F) as u16) << 7) | (self.lsb & 0x7F) as u16
    }

    /// Fine (1) and coarse (2) tuning are the only parameters that carry pitch.
    pub fn selects_tuning(&self) -> bool {
        matches!(self.value(), 1 | 2)
    }
}

/// What the rewriting pass did to one track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackReport {
    pub index: usize,
    pub octave_shifts: [i8; CHANNELS],
    pub notes: usize,
    pub tuning_values: usize,
    pub pitch_bends: usize,
    /// Invalid instruction that stopped the track; bytes from there on are untouched.
    pub halted: Option<DecodeError>,
}

/// Mirror every pitch-bearing value of track `index` in place.
///
/// Notes on the percussion channel keep their pitch. Tuning data entry and
/// pitch bend are mirrored on every channel. With `preserve_octaves`, each
/// mirrored note is moved by its channel's entry in `octave_shifts` unless
/// that entry is ±11.
pub fn transpose_track(
    track: &mut Track,
    index: usize,
    octave_shifts: &[i8; CHANNELS],
    preserve_octaves: bool,
) -> Result<TrackReport, DecodeError> {
    let mut report = TrackReport {
        index,
        octave_shifts: *octave_shifts,
        notes: 0,
        tuning_values: 0,
        pitch_bends: 0,
        halted: None,
    };
    let mut stream = EventStream::new(index);
    let mut rpn = RpnRegister::default();

    loop {
        let event = match stream.next_event(track.as_bytes()) {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) if err.is_track_local() => {
                warn!("{}", err);
                report.halted = Some(err);
                break;
            }
            Err(err) => return Err(err),
        };
        let EventKind::ChannelVoice { channel, message } = event.kind else {
            continue;
        };
        let bytes = track.as_bytes_mut();

        match message {
            VoiceMessage::NoteOff { key, .. }
            | VoiceMessage::NoteOn { key, .. }
            | VoiceMessage::PolyAftertouch { key, .. } => {
                if channel == PERCUSSION_CHANNEL {
                    continue;
                }
                let mut note = mirror_note(bytes[key]);
                let shift = octave_shifts[channel as usize];
                if preserve_octaves && shift.abs() != IGNORED_SHIFT {
                    note = shift_octaves(note, shift);
                }
                bytes[key] = note;
                report.notes += 1;
            }
            VoiceMessage::ControlChange { controller, value } => match bytes[controller] {
                RPN_LSB => rpn.lsb = bytes[value],
                RPN_MSB => rpn.msb = bytes[value],
                DATA_ENTRY_MSB | DATA_ENTRY_LSB if rpn.selects_tuning() => {
                    bytes[value] = mirror_note(bytes[value]);
                    report.tuning_values += 1;
                }
                _ => {}
            },
            VoiceMessage::PitchBend { lsb, msb } => {
                let (new_lsb, new_msb) = mirror_pitch_bend(bytes[lsb], bytes[msb]);
                bytes[lsb] = new_lsb;
                bytes[msb] = new_msb;
                report.pitch_bends += 1;
            }
            VoiceMessage::ProgramChange { .. } | VoiceMessage::ChannelPressure { .. } => {}
        }
    }

    debug!(
        "Track {} reformatted: {} notes, {} tuning values, {} pitch bends",
        index + 1,
        report.notes,
        report.tuning_values,
        report.pitch_bends
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn track(payload: &[u8]) -> Track {
        let mut out = b"MTrk".to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        Track::from_chunk(out)
    }

    const NO_SHIFT: [i8; CHANNELS] = [0; CHANNELS];

    #[test]
    fn mirror_note_reflects_range() {
        assert_eq!(mirror_note(0), 127);
        assert_eq!(mirror_note(1), 126);
        assert_eq!(mirror_note(60), 67);
        for note in 0..=127u8 {
            assert_eq!(mirror_note(mirror_note(note)), note);
        }
    }

    #[test]
    fn pitch_bend_centre_and_extremes() {
        // 0x2000 is the centre; mirrored it becomes 0x1FFF
        assert_eq!(mirror_pitch_bend(0x00, 0x40), (0x7F, 0x3F));
        assert_eq!(mirror_pitch_bend(0x00, 0x00), (0x7F, 0x7F));
        for (lsb, msb) in [(0x12, 0x34), (0x7F, 0x00), (0x01, 0x7E)] {
            let (l, m) = mirror_pitch_bend(lsb, msb);
            assert_eq!(mirror_pitch_bend(l, m), (lsb, msb));
        }
    }

    #[test]
    fn octave_shift_wraps_back_into_range() {
        assert_eq!(shift_octaves(67, -1), 55);
        assert_eq!(shift_octaves(100, 2), 124);
        // 120 + 12 = 132, one octave dropped
        assert_eq!(shift_octaves(120, 1), 120);
        // 5 - 12 wraps to 249 and keeps dropping until it clears the top bit
        assert_eq!(shift_octaves(5, -1), 117);
    }

    #[test]
    fn rpn_register_gates_tuning() {
        assert!(!RpnRegister::default().selects_tuning());
        assert!(RpnRegister { msb: 0, lsb: 1 }.selects_tuning());
        assert!(RpnRegister { msb: 0, lsb: 2 }.selects_tuning());
        assert!(!RpnRegister { msb: 1, lsb: 1 }.selects_tuning());
    }

    #[test]
    fn notes_are_mirrored_except_percussion() {
        let mut t = track(&[
            0x00, 0x90, 0x3C, 0x64,
            0x00, 0x99, 0x24, 0x64,
            0x00, 0x80, 0x3C, 0x00,
        ]);
        let report = transpose_track(&mut t, 0, &NO_SHIFT, false).unwrap();
        assert_eq!(
            t.payload(),
            &[0x00, 0x90, 0x43, 0x64, 0x00, 0x99, 0x24, 0x64, 0x00, 0x80, 0x43, 0x00]
        );
        assert_eq!(report.notes, 2);
        assert_eq!(report.halted, None);
    }

    #[test]
    fn preserve_octaves_applies_channel_shift() {
        let mut shifts = NO_SHIFT;
        shifts[0] = -1;
        shifts[1] = 11;
        let mut t = track(&[0x00, 0x90, 0x3C, 0x64, 0x00, 0x91, 0x3C, 0x64]);
        transpose_track(&mut t, 0, &shifts, true).unwrap();
        // 60 -> 67 -> 55 on channel 0; channel 1's shift of 11 is skipped
        assert_eq!(t.payload(), &[0x00, 0x90, 0x37, 0x64, 0x00, 0x91, 0x43, 0x64]);

        let mut t = track(&[0x00, 0x90, 0x3C, 0x64]);
        transpose_track(&mut t, 0, &shifts, false).unwrap();
        assert_eq!(t.payload(), &[0x00, 0x90, 0x43, 0x64]);
    }

    #[test]
    fn tuning_data_entry_follows_rpn() {
        let mut t = track(&[
            0x00, 0xB0, 0x06, 0x10, // data entry before any RPN: untouched
            0x00, 0xB0, 0x65, 0x00, // RPN MSB 0
            0x00, 0xB0, 0x64, 0x02, // RPN LSB 2, coarse tuning
            0x00, 0xB0, 0x06, 0x10, // mirrored
            0x00, 0xB9, 0x26, 0x20, // mirrored, even on percussion
            0x00, 0xB0, 0x64, 0x00, // RPN 0, bend range
            0x00, 0xB0, 0x06, 0x10, // untouched
        ]);
        let report = transpose_track(&mut t, 0, &NO_SHIFT, false).unwrap();
        assert_eq!(
            t.payload(),
            &[
                0x00, 0xB0, 0x06, 0x10,
                0x00, 0xB0, 0x65, 0x00,
                0x00, 0xB0, 0x64, 0x02,
                0x00, 0xB0, 0x06, 0x6F,
                0x00, 0xB9, 0x26, 0x5F,
                0x00, 0xB0, 0x64, 0x00,
                0x00, 0xB0, 0x06, 0x10,
            ]
        );
        assert_eq!(report.tuning_values, 2);
    }

    #[test]
    fn pitch_bend_is_mirrored_on_every_channel() {
        let mut t = track(&[0x00, 0xE9, 0x00, 0x40, 0x00, 0xE0, 0x7F, 0x7F]);
        let report = transpose_track(&mut t, 0, &NO_SHIFT, true).unwrap();
        assert_eq!(t.payload(), &[0x00, 0xE9, 0x7F, 0x3F, 0x00, 0xE0, 0x00, 0x00]);
        assert_eq!(report.pitch_bends, 2);
    }

    #[test]
    fn invalid_instruction_leaves_rest_untouched() {
        let payload = [
            0x00, 0x90, 0x3C, 0x64,
            0x00, 0xF4, // undefined system common byte
            0x00, 0x90, 0x3C, 0x64,
        ];
        let mut t = track(&payload);
        let report = transpose_track(&mut t, 1, &NO_SHIFT, false).unwrap();
        assert_eq!(&t.payload()[..4], &[0x00, 0x90, 0x43, 0x64]);
        assert_eq!(&t.payload()[4..], &payload[4..]);
        assert_eq!(
            report.halted,
            Some(DecodeError::InvalidInstruction { track: 1, offset: 13, instruction: 0xF })
        );
    }

    #[test]
    fn rewriting_twice_restores_original() {
        let payload = [
            0x00, 0xFF, 0x03, 0x02, b'h', b'i',
            0x00, 0x92, 0x10, 0x64, 0x30, 0x20, 0x64, // running status
            0x00, 0xE2, 0x11, 0x22,
            0x00, 0xB2, 0x65, 0x00, 0x00, 0xB2, 0x64, 0x01, 0x00, 0xB2, 0x06, 0x33,
            0x00, 0xF0, 0x02, 0x01, 0x02, 0xF7,
            0x00, 0x82, 0x10, 0x00,
        ];
        let mut t = track(&payload);
        transpose_track(&mut t, 0, &NO_SHIFT, false).unwrap();
        assert_ne!(t.payload(), &payload[..]);
        transpose_track(&mut t, 0, &NO_SHIFT, false).unwrap();
        assert_eq!(t.payload(), &payload[..]);
    }
}
