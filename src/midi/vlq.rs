//! MIDI variable-length quantities: base-128, most significant group first,
//! top bit of every byte except the last set as a continuation flag.

/// Longest encoding accepted, which caps values at 2^28 - 1.
pub const MAX_LEN: usize = 4;

/// Largest value that fits in [`MAX_LEN`] bytes.
pub const MAX_VALUE: u32 = 0x0FFF_FFFF;

/// Decode the quantity starting at `pos`.
///
/// Returns the value and the number of bytes it occupied. Reading stops at the
/// first byte with its top bit clear or after [`MAX_LEN`] bytes, whichever
/// comes first. `None` means the buffer ended before the quantity did.
pub fn decode(buf: &[u8], pos: usize) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    for len in 1..=MAX_LEN {
        let byte = *buf.get(pos + len - 1)?;
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Some((value, len));
        }
    }
    Some((value, MAX_LEN))
}

/// Encode `value`, or `None` if it needs more than [`MAX_LEN`] bytes.
pub fn encode(value: u32) -> Option<Vec<u8>> {
    if value > MAX_VALUE {
        return None;
    }
    let mut bytes = [0u8; MAX_LEN];
    let mut i = MAX_LEN - 1;
    let mut rest = value;
    bytes[i] = (rest & 0x7F) as u8;
    rest >>= 7;
    while rest > 0 {
        i -= 1;
        bytes[i] = ((rest & 0x7F) | 0x80) as u8;
        rest >>= 7;
    }
    Some(bytes[i..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte() {
        assert_eq!(decode(&[0x40], 0), Some((0x40, 1)));
        assert_eq!(encode(0x40), Some(vec![0x40]));
    }

    #[test]
    fn decodes_from_offset() {
        let buf = [0x00, 0x00, 0x81, 0x00, 0x90];
        assert_eq!(decode(&buf, 2), Some((128, 2)));
    }

    #[test]
    fn boundary_values_round_trip() {
        let cases: [(u32, &[u8]); 7] = [
            (0, &[0x00]),
            (127, &[0x7F]),
            (128, &[0x81, 0x00]),
            (16383, &[0xFF, 0x7F]),
            (16384, &[0x81, 0x80, 0x00]),
            (2_097_151, &[0xFF, 0xFF, 0x7F]),
            (268_435_455, &[0xFF, 0xFF, 0xFF, 0x7F]),
        ];
        for (value, bytes) in cases {
            let encoded = encode(value).unwrap();
            assert_eq!(encoded, bytes, "encoding {}", value);
            assert_eq!(decode(&encoded, 0), Some((value, bytes.len())), "decoding {}", value);
        }
    }

    #[test]
    fn stops_after_four_bytes() {
        // A fifth continuation byte is left for the caller.
        let buf = [0x81, 0x81, 0x81, 0x81, 0x01];
        assert_eq!(decode(&buf, 0), Some((0x0020_4081, 4)));
    }

    #[test]
    fn overrun_is_reported() {
        assert_eq!(decode(&[0x81, 0x80], 0), None);
        assert_eq!(decode(&[], 0), None);
    }

    #[test]
    fn rejects_values_above_28_bits() {
        assert_eq!(encode(MAX_VALUE + 1), None);
    }
}
