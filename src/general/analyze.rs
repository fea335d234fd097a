use tracing::debug;

use crate::error::DecodeError;
use crate::midi::event::{EventKind, Events};

pub const CHANNELS: usize = 16;

/// General MIDI percussion channel, zero-based.
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Lowest and highest note seen on one channel of one track.
///
/// Starts at the sentinel `min = 127, max = 0`, which a channel without notes
/// keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelPitchStats {
    pub min: u8,
    pub max: u8,
}

impl Default for ChannelPitchStats {
    fn default() -> Self {
        ChannelPitchStats { min: 127, max: 0 }
    }
}

impl ChannelPitchStats {
    pub fn observe(&mut self, pitch: u8) {
        self.min = self.min.min(pitch);
        self.max = self.max.max(pitch);
    }

    pub fn has_notes(&self) -> bool {
        self.min <= self.max
    }

    pub fn octave_shift(&self) -> i8 {
        octave_shift(self.min, self.max)
    }
}

/// Whole octaves that move the mirrored range back toward the original one.
///
/// Half-way quotients round toward positive infinity. When the centres sit
/// an odd number of tritones apart and that rounding lands on an odd octave
/// count, the count is lowered by one.
pub fn octave_shift(min: u8, max: u8) -> i8 {
    let center = (min as f64 + max as f64) / 2.0;
    let mirrored_center = ((min ^ 0x7F) as f64 + (max ^ 0x7F) as f64) / 2.0;
    let diff = center - mirrored_center;
    let mut shift = (diff / 12.0 + 0.5).floor() as i8;
    if diff % 6.0 == 0.0 && diff % 12.0 != 0.0 && shift % 2 != 0 {
        shift -= 1;
    }
    shift
}

/// Result of the read-only pass over one track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackAnalysis {
    pub stats: [ChannelPitchStats; CHANNELS],
    pub octave_shifts: [i8; CHANNELS],
}

/// Collect per-channel note ranges of track `index` and pick its octave shifts.
///
/// Only note off, note on and aftertouch count toward a range. An invalid
/// instruction ends the walk but keeps what was seen before it; any other
/// decode error is returned.
pub fn analyze_track(bytes: &[u8], index: usize) -> Result<TrackAnalysis, DecodeError> {
    let mut stats = [ChannelPitchStats::default(); CHANNELS];

    for event in Events::new(bytes, index) {
        let event = match event {
            Ok(event) => event,
            Err(err) if err.is_track_local() => {
                debug!("Analysis of track {} stopped: {}", index + 1, err);
                break;
            }
            Err(err) => return Err(err),
        };
        if let EventKind::ChannelVoice { channel, message } = event.kind {
            if let Some(key) = message.key() {
                stats[channel as usize].observe(bytes[key]);
            }
        }
    }

    let mut octave_shifts = [0i8; CHANNELS];
    for (shift, channel) in octave_shifts.iter_mut().zip(stats.iter()) {
        *shift = channel.octave_shift();
    }
    debug!("Track {} analyzed, octave shifts {:?}", index + 1, octave_shifts);

    Ok(TrackAnalysis {
        stats,
        octave_shifts,
    })
}
