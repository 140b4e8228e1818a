//! Protobuf-style primitives of the metadata payload.
//!
//! The payload is a sequence of fields. Each field starts with a key
//! `(field_number << 3) | wire_type` encoded as a varint, followed by either a varint
//! value or a varint length and that many bytes of a nested message. Only these two
//! wire types are produced; the reader skips fixed-width fields it does not know.
//!
//! Signed values are zig-zag encoded so small negative numbers stay short.

/// Wire type of a varint encoded scalar
pub const WIRE_VARINT: u8 = 0;
/// Wire type of a 64-bit fixed-width value
pub const WIRE_FIXED64: u8 = 1;
/// Wire type of a length-delimited value (nested message)
pub const WIRE_LENGTH_DELIMITED: u8 = 2;
/// Wire type of a 32-bit fixed-width value
pub const WIRE_FIXED32: u8 = 5;

/// Appends `value` as a LEB128 varint.
pub fn write_varint(buffer: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buffer.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buffer.push(value as u8);
}

/// Appends a field key.
pub fn write_key(buffer: &mut Vec<u8>, field: u32, wire_type: u8) {
    write_varint(buffer, u64::from(field) << 3 | u64::from(wire_type));
}

/// Maps a signed value onto an unsigned one, interleaving positive and negative values.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn zigzag_decode(value: u64) -> i64 {
    (value >> 1) as i64 ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_encoding() {
        let cases: [(u64, &[u8]); 4] = [
            (0, &[0x00]),
            (0x7F, &[0x7F]),
            (0x80, &[0x80, 0x01]),
            (300, &[0xAC, 0x02]),
        ];

        for (value, expected) in cases {
            let mut buffer = Vec::new();
            write_varint(&mut buffer, value);
            assert_eq!(buffer, expected);
        }
    }

    #[test]
    fn key_encoding() {
        let mut buffer = Vec::new();
        write_key(&mut buffer, 2, WIRE_LENGTH_DELIMITED);
        assert_eq!(buffer, [0x12]);
    }

    #[test]
    fn zigzag_values() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        for value in [i64::MIN, -300, 0, 42, i64::MAX] {
            assert_eq!(zigzag_decode(zigzag_encode(value)), value);
        }
    }
}
