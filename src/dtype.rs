//! Numeric element kinds for pixel buffers.
//!
//! Backends describe their element type with a short code (`u2`, `f4`, ...).
//! This module maps those codes onto a closed enumeration so every consumer
//! works from one authoritative table of element kinds and byte widths
//! instead of keying into a dynamic registry by name.

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedDtype;

/// The numeric element kind of a pixel source.
///
/// This is the full set of element kinds the access layer supports. Buffer
/// sizing, volume assembly and descriptor validation all go through
/// [`Dtype::size`] rather than carrying ad-hoc byte widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dtype {
    Uint8,
    Uint16,
    Uint32,
    Int8,
    Int16,
    Int32,
    Float32,
}

impl Dtype {
    /// Element size in bytes.
    #[inline]
    pub fn size(self) -> usize {
        match self {
            Dtype::Uint8 | Dtype::Int8 => 1,
            Dtype::Uint16 | Dtype::Int16 => 2,
            Dtype::Uint32 | Dtype::Int32 | Dtype::Float32 => 4,
        }
    }

    /// Parse a backend dtype code.
    ///
    /// Codes follow the numpy-style `<kind><bytes>` convention used by
    /// chunked array stores: `u1`, `u2`, `u4`, `i1`, `i2`, `i4`, `f4`.
    /// A leading byte-order character (`<`, `>`, `|`) is tolerated and
    /// ignored; windowing and assembly never reorder bytes within elements.
    pub fn from_code(code: &str) -> Result<Self, UnsupportedDtype> {
        let suffix = code.trim_start_matches(['<', '>', '|']);
        match suffix {
            "u1" => Ok(Dtype::Uint8),
            "u2" => Ok(Dtype::Uint16),
            "u4" => Ok(Dtype::Uint32),
            "i1" => Ok(Dtype::Int8),
            "i2" => Ok(Dtype::Int16),
            "i4" => Ok(Dtype::Int32),
            "f4" => Ok(Dtype::Float32),
            _ => Err(UnsupportedDtype {
                code: code.to_string(),
            }),
        }
    }

    /// The code this dtype would carry in a chunked store's metadata.
    pub fn code(self) -> &'static str {
        match self {
            Dtype::Uint8 => "u1",
            Dtype::Uint16 => "u2",
            Dtype::Uint32 => "u4",
            Dtype::Int8 => "i1",
            Dtype::Int16 => "i2",
            Dtype::Int32 => "i4",
            Dtype::Float32 => "f4",
        }
    }
}
