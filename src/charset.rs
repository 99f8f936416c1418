//! Text encoding used to decode record fields.
//!
//! A [`Charset`] pairs an `encoding_rs` encoding with its preamble, the
//! byte-order mark that may lead the input. Offsets in a record are byte
//! offsets, so the charset is only consulted after a field's bytes have been
//! sliced out of the line.

use std::fmt;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

use crate::error::{FixedLengthError, Result};

const UTF_8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF_16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF_16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Encoding of a fixed-length file.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    encoding: &'static Encoding,
    use_preamble: bool,
}

impl Charset {
    /// Charset for `encoding`, with its byte-order mark treated as preamble.
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            use_preamble: true,
        }
    }

    /// UTF-8 with an optional leading byte-order mark.
    pub fn utf8() -> Self {
        Self::new(UTF_8)
    }

    /// Look up a charset by WHATWG label, e.g. `"utf-8"` or `"shift_jis"`.
    pub fn for_label(label: &str) -> Result<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Self::new)
            .ok_or_else(|| FixedLengthError::UnknownEncoding(label.to_string()))
    }

    /// Same encoding, but never strip a leading byte-order mark.
    pub fn without_preamble(self) -> Self {
        Self {
            use_preamble: false,
            ..self
        }
    }

    /// The underlying encoding.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Byte-order mark consumed before the first record, empty if none.
    pub fn preamble(&self) -> &'static [u8] {
        if !self.use_preamble {
            return &[];
        }
        if self.encoding == UTF_8 {
            UTF_8_BOM
        } else if self.encoding == UTF_16LE {
            UTF_16LE_BOM
        } else if self.encoding == UTF_16BE {
            UTF_16BE_BOM
        } else {
            &[]
        }
    }

    /// Decode `bytes` into a string.
    ///
    /// Malformed sequences, including characters cut by a field boundary,
    /// decode to U+FFFD rather than failing.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, _had_errors) = self.encoding.decode_without_bom_handling(bytes);
        text.into_owned()
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Charset")
            .field("encoding", &self.encoding.name())
            .field("use_preamble", &self.use_preamble)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::SHIFT_JIS;

    #[test]
    fn test_preamble_per_encoding() {
        assert_eq!(Charset::utf8().preamble(), &[0xEF, 0xBB, 0xBF]);
        assert_eq!(Charset::new(UTF_16LE).preamble(), &[0xFF, 0xFE]);
        assert_eq!(Charset::new(UTF_16BE).preamble(), &[0xFE, 0xFF]);
        assert!(Charset::new(SHIFT_JIS).preamble().is_empty());
        assert!(Charset::utf8().without_preamble().preamble().is_empty());
    }

    #[test]
    fn test_for_label() {
        assert_eq!(Charset::for_label("Shift_JIS").unwrap().encoding(), SHIFT_JIS);
        assert_eq!(Charset::for_label(" utf-8 ").unwrap(), Charset::utf8());
        assert!(matches!(
            Charset::for_label("klingon"),
            Err(FixedLengthError::UnknownEncoding(label)) if label == "klingon"
        ));
    }

    #[test]
    fn test_decode_shift_jis() {
        let (bytes, _, _) = SHIFT_JIS.encode("ｱいう");
        assert_eq!(Charset::new(SHIFT_JIS).decode(&bytes), "ｱいう");
    }

    #[test]
    fn test_decode_split_character_is_replaced() {
        let bytes = "あ".as_bytes();
        assert_eq!(Charset::utf8().decode(&bytes[..2]), "\u{FFFD}");
    }

    #[test]
    fn test_decode_keeps_bom_bytes() {
        // Preamble stripping belongs to the line splitter, not to field decoding.
        let decoded = Charset::utf8().decode(&[0xEF, 0xBB, 0xBF, b'A']);
        assert_eq!(decoded, "\u{FEFF}A");
    }
}
