use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EncodingError;

/// The text encodings a tree may be configured with.
///
/// Records supplied as text are turned into bytes via `encode` before being
/// fed to the hash engine; a record that cannot be represented loses nothing
/// by raising [`EncodingError`] rather than lossily substituting.
///
/// `iso-8859-1` (Latin-1) stands in for the wider "iso-8859 family" named in
/// the spec: it is the only member expressible as a fixed byte-per-codepoint
/// mapping without a full charset table, and its name is namespaced so
/// siblings could be added later without an encoding-string break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum TextEncoding {
    Utf8,
    Utf16,
    Utf16Le,
    Utf16Be,
    Utf32,
    Ascii,
    Iso8859_1,
}

impl TextEncoding {
    /// Encodes `text` to bytes, failing if the encoding cannot represent it.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, EncodingError> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii => {
                if text.is_ascii() {
                    Ok(text.as_bytes().to_vec())
                } else {
                    Err(self.undecodable())
                }
            }
            TextEncoding::Iso8859_1 => {
                let mut out = Vec::with_capacity(text.len());
                for c in text.chars() {
                    let codepoint = c as u32;
                    if codepoint > 0xFF {
                        return Err(self.undecodable());
                    }
                    out.push(codepoint as u8);
                }
                Ok(out)
            }
            TextEncoding::Utf16 => {
                let mut out = Vec::with_capacity(2 + text.len() * 2);
                out.extend_from_slice(&0xFEFFu16.to_le_bytes());
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Ok(out)
            }
            TextEncoding::Utf16Le => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Ok(out)
            }
            TextEncoding::Utf16Be => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                Ok(out)
            }
            TextEncoding::Utf32 => {
                let mut out = Vec::with_capacity(4 + text.chars().count() * 4);
                out.extend_from_slice(&0x0000_FEFFu32.to_le_bytes());
                for c in text.chars() {
                    out.extend_from_slice(&(c as u32).to_le_bytes());
                }
                Ok(out)
            }
        }
    }

    fn undecodable(&self) -> EncodingError {
        EncodingError {
            encoding: self.name(),
        }
    }

    /// The canonical string name used in JSON proof forms.
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Utf16Le => "utf-16-le",
            TextEncoding::Utf16Be => "utf-16-be",
            TextEncoding::Utf32 => "utf-32",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Iso8859_1 => "iso-8859-1",
        }
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding::Utf8
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A name outside the supported catalog was given at construction time.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported text encoding '{0}'")]
pub struct UnknownEncoding(pub String);

impl FromStr for TextEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-16" | "utf16" => Ok(TextEncoding::Utf16),
            "utf-16-le" | "utf16le" => Ok(TextEncoding::Utf16Le),
            "utf-16-be" | "utf16be" => Ok(TextEncoding::Utf16Be),
            "utf-32" | "utf32" => Ok(TextEncoding::Utf32),
            "ascii" => Ok(TextEncoding::Ascii),
            "iso-8859-1" | "latin-1" | "latin1" => Ok(TextEncoding::Iso8859_1),
            other => Err(UnknownEncoding(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_roundtrips_anything() {
        assert_eq!(TextEncoding::Utf8.encode("héllo").unwrap(), "héllo".as_bytes());
    }

    #[test]
    fn ascii_rejects_non_ascii() {
        assert!(TextEncoding::Ascii.encode("héllo").is_err());
        assert_eq!(TextEncoding::Ascii.encode("hello").unwrap(), b"hello");
    }

    #[test]
    fn iso_8859_1_rejects_above_0xff() {
        assert!(TextEncoding::Iso8859_1.encode("日本語").is_err());
        assert_eq!(TextEncoding::Iso8859_1.encode("café").unwrap(), vec![99, 97, 102, 233]);
    }

    #[test]
    fn utf16_variants_differ_by_byte_order_and_bom() {
        let with_bom = TextEncoding::Utf16.encode("a").unwrap();
        let le = TextEncoding::Utf16Le.encode("a").unwrap();
        let be = TextEncoding::Utf16Be.encode("a").unwrap();
        assert_eq!(with_bom, vec![0xFF, 0xFE, 0x61, 0x00]);
        assert_eq!(le, vec![0x61, 0x00]);
        assert_eq!(be, vec![0x00, 0x61]);
    }

    #[test]
    fn from_str_rejects_unknown_names() {
        assert!("shift-jis".parse::<TextEncoding>().is_err());
        assert_eq!("utf-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
    }
}
