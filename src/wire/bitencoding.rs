//! Packing of the binary payload into `d1` strings.
//!
//! Annotation values can only hold strings, so the payload bytes are repacked into
//! 7-bit groups, one group per character. Each group is shifted by one modulo 128:
//! zero groups are by far the most common and the class file format stores `U+0000`
//! in two bytes, while `U+0001` takes one. The resulting text is cut into chunks
//! that each fit a single UTF-8 constant.

use crate::Result;

/// Encodes `bytes` into `d1` chunks of at most `max_chunk` bytes in class file UTF-8 form.
///
/// An empty payload produces no chunks at all.
#[must_use]
pub fn encode_bytes(bytes: &[u8], max_chunk: usize) -> Vec<String> {
    let mut text = String::with_capacity(bytes.len() * 8 / 7 + 1);
    let mut accumulator = 0u32;
    let mut bits = 0u32;

    for &byte in bytes {
        accumulator = accumulator << 8 | u32::from(byte);
        bits += 8;
        while bits >= 7 {
            bits -= 7;
            push_group(&mut text, (accumulator >> bits) & 0x7F);
        }
        accumulator &= (1 << bits) - 1;
    }

    if bits > 0 {
        push_group(&mut text, (accumulator << (7 - bits)) & 0x7F);
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for ch in text.chars() {
        // U+0000 takes two bytes in a class file UTF-8 constant
        let width = if ch == '\0' { 2 } else { 1 };
        if current_len + width > max_chunk && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push(ch);
        current_len += width;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn push_group(text: &mut String, group: u32) {
    // group < 0x80, always a valid scalar value
    text.push(char::from(((group + 1) & 0x7F) as u8));
}

/// Decodes the concatenation of `chunks` back into the payload bytes.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if a chunk contains a character outside the
/// 7-bit range.
pub fn decode_bytes(chunks: &[String]) -> Result<Vec<u8>> {
    let total: usize = chunks.iter().map(String::len).sum();
    let mut bytes = Vec::with_capacity(total * 7 / 8);
    let mut accumulator = 0u32;
    let mut bits = 0u32;

    for ch in chunks.iter().flat_map(|chunk| chunk.chars()) {
        let code = u32::from(ch);
        if code >= 0x80 {
            return Err(malformed_error!(
                "Invalid character U+{:04X} in encoded metadata",
                code
            ));
        }

        accumulator = accumulator << 7 | ((code + 0x7F) & 0x7F);
        bits += 7;
        if bits >= 8 {
            bits -= 8;
            bytes.push((accumulator >> bits) as u8);
            accumulator &= (1 << bits) - 1;
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bytes_become_ones() {
        let chunks = encode_bytes(&[0, 0, 0, 0, 0, 0, 0], 100);
        assert_eq!(chunks, vec!["\u{1}".repeat(8)]);
    }

    #[test]
    fn group_127_wraps_to_nul() {
        let chunks = encode_bytes(&[0xFE], 100);
        // 11111110 -> 1111111, 0000000
        assert_eq!(chunks, vec!["\u{0}\u{1}".to_string()]);
    }

    #[test]
    fn payload_lengths_survive_padding() {
        for len in 0..40usize {
            let bytes: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            let chunks = encode_bytes(&bytes, 5);
            assert!(chunks.iter().all(|c| c.chars().count() <= 5));
            assert_eq!(decode_bytes(&chunks).unwrap(), bytes);
        }
    }

    #[test]
    fn nul_characters_count_double() {
        // 0xFE 0xFE -> groups 127, 63, 64: NUL, '@', 'A'
        let chunks = encode_bytes(&[0xFE, 0xFE], 2);
        assert_eq!(chunks[0], "\u{0}");
        assert_eq!(decode_bytes(&chunks).unwrap(), vec![0xFE, 0xFE]);
    }

    #[test]
    fn empty_payload_has_no_chunks() {
        assert!(encode_bytes(&[], 10).is_empty());
        assert!(decode_bytes(&[]).unwrap().is_empty());
    }

    #[test]
    fn wide_characters_are_rejected() {
        assert!(decode_bytes(&["\u{100}".to_string()]).is_err());
    }
}
