// appinfo.vdf file header: magic, universe and (v29) string table offset.

use log::debug;

use super::cursor::Cursor;
use super::decoder::DecodeError;

// ---------------------------------------------------------------------------
// Magic constants
// ---------------------------------------------------------------------------

/// `'DV\x07` with revision byte 0x27: inline keys, no binary data hash.
pub const MAGIC_V27: u32 = 0x0756_4427;
/// Revision 0x28: inline keys, adds the binary data hash.
pub const MAGIC_V28: u32 = 0x0756_4428;
/// Revision 0x29: keys are indices into a string table at the end of the file.
pub const MAGIC_V29: u32 = 0x0756_4429;

/// Byte length of the SHA-1 digests carried by every record.
pub const HASH_LEN: usize = 20;

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// On-disk format revision, identified by the magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Version {
    V27,
    V28,
    V29,
}

impl Version {
    /// Map a magic value to its revision; `None` for anything unrecognized.
    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            MAGIC_V27 => Some(Self::V27),
            MAGIC_V28 => Some(Self::V28),
            MAGIC_V29 => Some(Self::V29),
            _ => None,
        }
    }

    pub fn magic(self) -> u32 {
        match self {
            Self::V27 => MAGIC_V27,
            Self::V28 => MAGIC_V28,
            Self::V29 => MAGIC_V29,
        }
    }

    /// Revision number as Steam writes it (27, 28 or 29).
    pub fn number(self) -> u32 {
        match self {
            Self::V27 => 27,
            Self::V28 => 28,
            Self::V29 => 29,
        }
    }

    /// Records carry a second 20-byte digest after the change number.
    #[inline]
    pub fn has_binary_data_hash(self) -> bool {
        self >= Self::V28
    }

    /// Keys are string table indices rather than inline strings.
    #[inline]
    pub fn has_string_pool(self) -> bool {
        self == Self::V29
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.number())
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Parsed file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Header {
    pub version: Version,
    /// Opaque environment identifier, passed through uninterpreted.
    pub universe: u32,
    /// Absolute offset of the string table (v29 only).
    pub string_table_offset: Option<i64>,
}

impl Header {
    /// Decode the header, leaving the cursor at the first app record.
    ///
    /// The magic is validated before anything else is read.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let magic = cursor.read_u32()?;
        let version =
            Version::from_magic(magic).ok_or(DecodeError::UnknownMagic { magic })?;
        let universe = cursor.read_u32()?;
        let string_table_offset = if version.has_string_pool() {
            Some(cursor.read_i64()?)
        } else {
            None
        };

        debug!(
            "appinfo header: version={version} universe={universe} \
             string_table_offset={string_table_offset:?}"
        );

        Ok(Self {
            version,
            universe,
            string_table_offset,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
