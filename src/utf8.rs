//! UTF-8 codepoint decoding driven by the leading-byte length dispatch.

/// Decode one codepoint from the start of `bytes`.
///
/// Returns the scalar value and the number of bytes consumed (1-4), per
/// the leading-byte patterns: `0xxxxxxx` is 1 byte, `110xxxxx` 2,
/// `1110xxxx` 3, `11110xxx` 4. Continuation bytes are masked but not
/// validated, and overlong sequences are not rejected — a known
/// limitation, acceptable for the compile-time demo string. A malformed
/// leading byte decodes as `(0, 1)`.
pub fn decode(bytes: &[u8]) -> (u32, usize) {
    let cont = |i: usize| bytes.get(i).map_or(0, |&b| u32::from(b) & 0x3F);

    let b0 = u32::from(bytes[0]);
    if b0 < 0x80 {
        (b0, 1)
    } else if b0 & 0xE0 == 0xC0 {
        ((b0 & 0x1F) << 6 | cont(1), 2)
    } else if b0 & 0xF0 == 0xE0 {
        ((b0 & 0x0F) << 12 | cont(1) << 6 | cont(2), 3)
    } else if b0 & 0xF8 == 0xF0 {
        ((b0 & 0x07) << 18 | cont(1) << 12 | cont(2) << 6 | cont(3), 4)
    } else {
        (0, 1)
    }
}

/// Lazy codepoint sequence over a string's bytes.
///
/// Restartable: construct a fresh iterator to walk the same text again
/// (the renderer does this once for the width pre-pass and once while
/// drawing).
pub struct Codepoints<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Codepoints<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }
}

impl Iterator for Codepoints<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let (cp, len) = decode(&self.bytes[self.pos..]);
        self.pos += len;
        Some(cp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_ascii() {
        assert_eq!(decode(b"A"), (0x41, 1));
        assert_eq!(decode(b"Hi"), (0x48, 1));
    }

    #[test]
    fn decode_two_byte() {
        // U+00A2 CENT SIGN
        assert_eq!(decode(&[0xC2, 0xA2]), (0xA2, 2));
    }

    #[test]
    fn decode_three_byte() {
        // U+4F60 "你"
        assert_eq!(decode(&[0xE4, 0xBD, 0xA0]), (0x4F60, 3));
    }

    #[test]
    fn decode_four_byte() {
        // U+1F600 GRINNING FACE
        assert_eq!(decode(&[0xF0, 0x9F, 0x98, 0x80]), (0x1F600, 4));
    }

    #[test]
    fn decode_malformed_lead() {
        // An orphan continuation byte and an invalid 0xF8 lead both consume
        // one byte and yield the zero codepoint.
        assert_eq!(decode(&[0x80]), (0, 1));
        assert_eq!(decode(&[0xFF, 0x41]), (0, 1));
    }

    #[test]
    fn decode_truncated_tail_is_total() {
        // A 3-byte lead with missing continuations must not panic.
        let (_, len) = decode(&[0xE4]);
        assert_eq!(len, 3);
    }

    #[test]
    fn codepoints_match_chars() {
        let text = "Hi, 你好，世界！🎉";
        let decoded: Vec<u32> = Codepoints::new(text).collect();
        let expected: Vec<u32> = text.chars().map(|c| c as u32).collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn codepoints_demo_string() {
        let cps: Vec<u32> = Codepoints::new("你好，世界！").collect();
        assert_eq!(cps, [0x4F60, 0x597D, 0xFF0C, 0x4E16, 0x754C, 0xFF01]);
    }
}
