//! PLY format keywords and payload encodings.

use std::fmt;

use crate::util::{Error, Result};

/// First line of every PLY file.
pub const PLY_MAGIC: &str = "ply";

/// Keyword selecting the payload encoding and format version.
pub const FORMAT_KEYWORD: &str = "format";

/// Keyword of a free-text comment line.
pub const COMMENT_KEYWORD: &str = "comment";

/// Keyword of an object info line.
pub const OBJ_INFO_KEYWORD: &str = "obj_info";

/// Keyword declaring an element and its record count.
pub const ELEMENT_KEYWORD: &str = "element";

/// Keyword declaring a property of the current element.
pub const PROPERTY_KEYWORD: &str = "property";

/// Marker following `property` for count-prefixed list properties.
pub const LIST_KEYWORD: &str = "list";

/// Last line of the header; the payload starts right after it.
pub const END_HEADER: &str = "end_header";

/// Format version written when none is given.
pub const DEFAULT_VERSION: f32 = 1.0;

/// Payload encoding declared by the `format` line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// One record per line, whitespace separated decimal tokens
    Ascii,
    /// Packed records, little-endian
    BinaryLittleEndian,
    /// Packed records, big-endian
    BinaryBigEndian,
}

impl Encoding {
    /// The header keyword for this encoding.
    #[inline]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::BinaryLittleEndian => "binary_little_endian",
            Self::BinaryBigEndian => "binary_big_endian",
        }
    }

    /// Parse the encoding keyword of a `format` line.
    pub fn from_keyword(keyword: &str) -> Result<Self> {
        match keyword {
            "ascii" => Ok(Self::Ascii),
            "binary_little_endian" => Ok(Self::BinaryLittleEndian),
            "binary_big_endian" => Ok(Self::BinaryBigEndian),
            _ => Err(Error::invalid(format!("unknown format '{keyword}'"))),
        }
    }

    /// Returns true for the two binary encodings.
    #[inline]
    pub const fn is_binary(self) -> bool {
        !matches!(self, Self::Ascii)
    }

    /// Binary encoding matching the byte order of the current target.
    #[inline]
    pub const fn native_binary() -> Self {
        if cfg!(target_endian = "little") {
            Self::BinaryLittleEndian
        } else {
            Self::BinaryBigEndian
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}
